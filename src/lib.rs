//! Vivah Match - discovery and like workflow service for the Vivah matrimony app
//!
//! This library provides the candidate filter pipeline, the optimistic
//! like/unlike workflow and the swipe session used by discovery, along with
//! curated match scoring, direct messaging and the store adapters they run
//! on.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    apply_all_filters, Curator, Discovery, DiscoverySession, LikeAction, LikeState, LikeWorkflow,
    Messenger, SwipeOutcome,
};
pub use error::{Error, Result};
pub use models::{
    is_valid_uuid, Gender, LikeQuota, MatchFilters, Preferences, Profile, ProfileId, SwipeDirection,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        assert!(is_valid_uuid("123"));
        assert!(!is_valid_uuid("not-an-id"));
        assert!(is_valid_uuid("550e8400-e29b-41d4-a716-446655440000"));
    }
}
