use serde::{Deserialize, Serialize};

use crate::core::likes::LikeAction;
use crate::core::messaging::MessageRequest;
use crate::core::session::SwipeOutcome;
use crate::models::domain::{LikeQuota, Message, Profile, ProfileId, ScoredMatch};

/// Response for the discover endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverResponse {
    pub profiles: Vec<Profile>,
    pub total_candidates: usize,
    pub quota: LikeQuota,
}

/// Result of a swipe or super-like, with the candidate shown next
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeResponse {
    pub outcome: SwipeOutcome,
    pub next: Option<Profile>,
    pub quota: LikeQuota,
}

/// Response for curated matches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuratedMatchesResponse {
    pub matches: Vec<ScoredMatch>,
    pub total_candidates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatusResponse {
    pub profile_id: ProfileId,
    pub liked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeActionResponse {
    pub profile_id: ProfileId,
    pub action: LikeAction,
    pub liked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileListResponse {
    pub profiles: Vec<Profile>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageListResponse {
    pub messages: Vec<Message>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequestListResponse {
    pub requests: Vec<MessageRequest>,
    pub count: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
