use crate::models::{MatchPriority, Profile, ScoreComponents};

/// Relative weights of the four score dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub interests: f64,
    pub age: f64,
    pub location: f64,
    pub religion: f64,
}

impl ScoringWeights {
    /// Weights for a priority: the prioritized dimension gets 0.4 and the
    /// rest share 0.3 / 0.15 / 0.15.
    pub fn for_priority(priority: MatchPriority) -> Self {
        match priority {
            MatchPriority::Interests => Self { interests: 0.40, age: 0.30, location: 0.15, religion: 0.15 },
            MatchPriority::Age => Self { age: 0.40, interests: 0.30, location: 0.15, religion: 0.15 },
            MatchPriority::Location => Self { location: 0.40, interests: 0.30, age: 0.15, religion: 0.15 },
            MatchPriority::Religion => Self { religion: 0.40, interests: 0.30, age: 0.15, location: 0.15 },
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::for_priority(MatchPriority::default())
    }
}

/// Calculate the per-dimension scores of `candidate` as seen by `viewer`
///
/// Scoring components:
/// - interests: shared / max(viewer count, candidate count), 0 if the viewer lists none
/// - location: 100 when the candidate's location contains the viewer's, else 50
/// - religion: 100 when equal, else 50
/// - age: 100 minus 5 points per year of difference, floored at 0
pub fn calculate_score_components(candidate: &Profile, viewer: &Profile) -> ScoreComponents {
    let shared_interests: Vec<String> = viewer
        .interests
        .iter()
        .filter(|interest| candidate.interests.contains(interest))
        .cloned()
        .collect();

    let interest_score = if viewer.interests.is_empty() {
        0.0
    } else {
        let denominator = viewer.interests.len().max(candidate.interests.len()) as f64;
        shared_interests.len() as f64 / denominator * 100.0
    };

    ScoreComponents {
        interest_score,
        location_score: calculate_location_score(&candidate.location, &viewer.location),
        religion_score: if candidate.religion == viewer.religion { 100.0 } else { 50.0 },
        age_score: calculate_age_score(candidate.age, viewer.age),
        shared_interests,
    }
}

/// Combine score components into a final 0-100 score
pub fn calculate_final_score(components: &ScoreComponents, weights: &ScoringWeights) -> f64 {
    let total = components.interest_score * weights.interests
        + components.age_score * weights.age
        + components.location_score * weights.location
        + components.religion_score * weights.religion;

    total.clamp(0.0, 100.0)
}

#[inline]
fn calculate_location_score(candidate: &str, viewer: &str) -> f64 {
    if !candidate.is_empty()
        && !viewer.is_empty()
        && candidate.to_lowercase().contains(&viewer.to_lowercase())
    {
        100.0
    } else {
        50.0
    }
}

#[inline]
fn calculate_age_score(candidate_age: u32, viewer_age: u32) -> f64 {
    let difference = candidate_age.abs_diff(viewer_age) as f64;
    (100.0 - difference * 5.0).max(0.0)
}
