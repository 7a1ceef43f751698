use crate::models::{Gender, Preferences, Profile};

/// Check whether a candidate complements the viewer's gender.
///
/// An unknown viewer gender matches nobody, and neither does a candidate
/// without a gender.
#[inline]
pub fn matches_gender(profile: &Profile, viewer_gender: Option<Gender>) -> bool {
    match (viewer_gender, profile.gender) {
        (Some(viewer), Some(candidate)) => candidate == viewer.opposite(),
        _ => false,
    }
}

/// Check an inclusive `[min, max]` age range; no range matches everyone
#[inline]
pub fn matches_age(profile: &Profile, age_range: Option<(u32, u32)>) -> bool {
    match age_range {
        Some((min, max)) => profile.age >= min && profile.age <= max,
        None => true,
    }
}

/// Exact tag comparison where an absent or empty wanted value is a wildcard
#[inline]
fn matches_tag(actual: Option<&str>, wanted: Option<&str>) -> bool {
    match wanted {
        Some(wanted) if !wanted.is_empty() => actual == Some(wanted),
        _ => true,
    }
}

#[inline]
pub fn matches_religion(profile: &Profile, religion: Option<&str>) -> bool {
    matches_tag(profile.religion.as_deref(), religion)
}

#[inline]
pub fn matches_civil_status(profile: &Profile, civil_status: Option<&str>) -> bool {
    matches_tag(profile.civil_status.as_deref(), civil_status)
}

/// Stage 1: keep candidates of the opposite gender
pub fn filter_by_gender(profiles: Vec<Profile>, viewer_gender: Option<Gender>) -> Vec<Profile> {
    if viewer_gender.is_none() {
        return Vec::new();
    }

    profiles
        .into_iter()
        .filter(|p| matches_gender(p, viewer_gender))
        .collect()
}

/// Stage 2: keep candidates inside the age range
pub fn filter_by_age(profiles: Vec<Profile>, age_range: Option<(u32, u32)>) -> Vec<Profile> {
    if age_range.is_none() {
        return profiles;
    }

    profiles
        .into_iter()
        .filter(|p| matches_age(p, age_range))
        .collect()
}

/// Stage 3: keep candidates with the requested religion
pub fn filter_by_religion(profiles: Vec<Profile>, religion: Option<&str>) -> Vec<Profile> {
    profiles
        .into_iter()
        .filter(|p| matches_religion(p, religion))
        .collect()
}

/// Stage 4: keep candidates with the requested civil status
pub fn filter_by_civil_status(profiles: Vec<Profile>, civil_status: Option<&str>) -> Vec<Profile> {
    profiles
        .into_iter()
        .filter(|p| matches_civil_status(p, civil_status))
        .collect()
}

/// Run the discovery filter pipeline.
///
/// # Pipeline Stages
/// 1. Gender complementarity
/// 2. Age range
/// 3. Religion
/// 4. Civil status
///
/// Gender always runs first so the remaining stages only see the narrowed
/// set. Survivors keep their input order.
pub fn apply_all_filters(
    profiles: Vec<Profile>,
    viewer_gender: Option<Gender>,
    preferences: Option<&Preferences>,
) -> Vec<Profile> {
    let profiles = filter_by_gender(profiles, viewer_gender);

    let Some(preferences) = preferences else {
        return profiles;
    };

    let profiles = filter_by_age(profiles, preferences.age_range);
    let profiles = filter_by_religion(profiles, preferences.religion.as_deref());
    filter_by_civil_status(profiles, preferences.civil_status.as_deref())
}
