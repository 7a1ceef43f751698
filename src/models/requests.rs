use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{MatchFilters, Preferences, SwipeDirection};

/// Request to list discovery candidates for the authenticated viewer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverRequest {
    #[serde(default)]
    pub preferences: Option<Preferences>,
}

/// Request for curated match suggestions
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CuratedMatchesRequest {
    #[serde(default)]
    pub filters: MatchFilters,
    #[validate(range(min = 1, max = 50))]
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Swipe on the current discovery candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeRequest {
    pub direction: SwipeDirection,
}

/// New chat message; at least one of text or image is required
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub text: String,
    #[validate(url)]
    #[serde(default)]
    pub image_url: Option<String>,
}
