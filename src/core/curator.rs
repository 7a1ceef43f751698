use std::cmp::Ordering;

use crate::core::filters::{matches_civil_status, matches_gender, matches_religion};
use crate::core::scoring::{calculate_final_score, calculate_score_components, ScoringWeights};
use crate::models::{MatchFilters, Profile, ScoredMatch};

/// Result of a curation pass
#[derive(Debug)]
pub struct CurationResult {
    pub matches: Vec<ScoredMatch>,
    pub total_candidates: usize,
}

/// Builds curated match suggestions: the best-scoring handful of candidates
/// for a viewer, ordered by the viewer's chosen priority.
#[derive(Debug, Clone)]
pub struct Curator {
    default_limit: usize,
}

impl Curator {
    pub fn new(default_limit: usize) -> Self {
        Self { default_limit }
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Score and rank `candidates` for `viewer`.
    ///
    /// Candidates of the same gender, the viewer's own profile and anything
    /// rejected by `filters` are dropped before scoring. Results are sorted by
    /// score (descending), then age (ascending), and truncated to `limit`.
    pub fn curate(
        &self,
        viewer: &Profile,
        candidates: Vec<Profile>,
        filters: &MatchFilters,
        limit: Option<usize>,
    ) -> CurationResult {
        let total_candidates = candidates.len();
        let limit = limit.unwrap_or(self.default_limit);
        let weights = ScoringWeights::for_priority(filters.priority);

        let mut matches: Vec<ScoredMatch> = candidates
            .into_iter()
            .filter(|profile| profile.id != viewer.id)
            .filter(|profile| matches_gender(profile, viewer.gender))
            .filter(|profile| matches_match_filters(profile, filters))
            .map(|profile| {
                let components = calculate_score_components(&profile, viewer);
                let match_score = calculate_final_score(&components, &weights);

                ScoredMatch {
                    profile,
                    match_score,
                    shared_interests: components.shared_interests,
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.profile.age.cmp(&b.profile.age))
        });

        matches.truncate(limit);

        tracing::debug!(
            "Curated {} of {} candidates for {}",
            matches.len(),
            total_candidates,
            viewer.id
        );

        CurationResult {
            matches,
            total_candidates,
        }
    }
}

impl Default for Curator {
    fn default() -> Self {
        Self::new(4)
    }
}

/// Check the curated-match filters (age bounds, religion, civil status,
/// location substring)
#[inline]
pub fn matches_match_filters(profile: &Profile, filters: &MatchFilters) -> bool {
    if filters.min_age.is_some_and(|min| profile.age < min) {
        return false;
    }

    if filters.max_age.is_some_and(|max| profile.age > max) {
        return false;
    }

    if !matches_religion(profile, filters.religion.as_deref())
        || !matches_civil_status(profile, filters.civil_status.as_deref())
    {
        return false;
    }

    match filters.location.as_deref() {
        Some(location) if !location.is_empty() => profile
            .location
            .to_lowercase()
            .contains(&location.to_lowercase()),
        _ => true,
    }
}
