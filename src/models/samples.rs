//! Demo profiles shown before a viewer has real candidates.
//!
//! These carry legacy numeric ids, so likes on them stay local.

use chrono::{Duration, Utc};

use crate::models::domain::{Gender, Profile, ProfileId};

struct Sample {
    id: &'static str,
    name: &'static str,
    age: u32,
    gender: Gender,
    occupation: &'static str,
    location: &'static str,
    interests: &'static [&'static str],
    bio: &'static str,
    image_url: &'static str,
    is_online: bool,
    minutes_since_active: i64,
    religion: &'static str,
    civil_status: &'static str,
}

const SAMPLES: &[Sample] = &[
    Sample {
        id: "1",
        name: "Anushka",
        age: 28,
        gender: Gender::Female,
        occupation: "Software Engineer",
        location: "Colombo, Sri Lanka",
        interests: &["Reading", "Traveling", "Cooking", "Technology"],
        bio: "Software engineer who loves to explore new cultures through food and travel. Looking for someone who shares my passion for learning and adventures.",
        image_url: "https://images.unsplash.com/photo-1534528741775-53994a69daeb?auto=format&fit=crop&w=1064&q=80",
        is_online: true,
        minutes_since_active: 2,
        religion: "hindu",
        civil_status: "single",
    },
    Sample {
        id: "2",
        name: "Raj",
        age: 32,
        gender: Gender::Male,
        occupation: "Doctor",
        location: "Kandy, Sri Lanka",
        interests: &["Fitness", "Music", "Photography", "Science"],
        bio: "Doctor by profession, photographer by passion. I believe in maintaining a healthy lifestyle and finding beauty in everyday moments.",
        image_url: "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?auto=format&fit=crop&w=774&q=80",
        is_online: false,
        minutes_since_active: 60,
        religion: "christian",
        civil_status: "single",
    },
    Sample {
        id: "3",
        name: "Priya",
        age: 27,
        gender: Gender::Female,
        occupation: "Marketing Manager",
        location: "Galle, Sri Lanka",
        interests: &["Dancing", "Painting", "Yoga", "Music"],
        bio: "Creative soul with a passion for arts and wellness. Looking for someone who appreciates life's simple pleasures and values personal growth.",
        image_url: "https://images.unsplash.com/photo-1494790108377-be9c29b29330?auto=format&fit=crop&w=774&q=80",
        is_online: true,
        minutes_since_active: 0,
        // changed from hindu on purpose: a male viewer filtering {25-30, hindu} sees only Anushka
        religion: "christian",
        civil_status: "single",
    },
    Sample {
        id: "4",
        name: "Arun",
        age: 30,
        gender: Gender::Male,
        occupation: "Financial Analyst",
        location: "Colombo, Sri Lanka",
        interests: &["Hiking", "Reading", "Travel", "Photography"],
        bio: "Finance professional with a love for the outdoors. Seeking a partner to share adventures and quiet moments alike.",
        image_url: "https://images.unsplash.com/photo-1500648767791-00dcc994a43e?auto=format&fit=crop&w=774&q=80",
        is_online: false,
        minutes_since_active: 180,
        religion: "muslim",
        civil_status: "divorced",
    },
    Sample {
        id: "5",
        name: "Divya",
        age: 26,
        gender: Gender::Female,
        occupation: "UX Designer",
        location: "Negombo, Sri Lanka",
        interests: &["Art", "Movies", "Technology", "Fashion"],
        bio: "Creative designer who believes in the power of good design to transform lives. Looking for someone who appreciates aesthetics and thoughtful conversation.",
        image_url: "https://images.unsplash.com/photo-1531746020798-e6953c6e8e04?auto=format&fit=crop&w=928&q=80",
        is_online: true,
        minutes_since_active: 5,
        religion: "buddhist",
        civil_status: "single",
    },
];

/// The five built-in discovery profiles
pub fn discovery_profiles() -> Vec<Profile> {
    let now = Utc::now();

    SAMPLES
        .iter()
        .map(|s| Profile {
            id: ProfileId::LocalOnly(s.id.to_string()),
            name: s.name.to_string(),
            age: s.age,
            gender: Some(s.gender),
            occupation: s.occupation.to_string(),
            location: s.location.to_string(),
            interests: s.interests.iter().map(|i| i.to_string()).collect(),
            bio: s.bio.to_string(),
            image_url: s.image_url.to_string(),
            is_online: s.is_online,
            last_active: Some(now - Duration::minutes(s.minutes_since_active)),
            religion: Some(s.religion.to_string()),
            civil_status: Some(s.civil_status.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_are_local_only() {
        let profiles = discovery_profiles();
        assert_eq!(profiles.len(), 5);
        assert!(profiles.iter().all(|p| !p.id.is_persisted()));
    }
}
