// Model exports
pub mod domain;
pub mod requests;
pub mod responses;
pub mod samples;

pub use domain::{
    conversation_id, is_valid_uuid, Gender, Like, LikeQuota, LikeStatus, MatchFilters, MatchPriority,
    Message, Preferences, Profile, ProfileId, ProfileRow, ScoreComponents, ScoredMatch,
    SwipeDirection,
};
pub use requests::{CuratedMatchesRequest, DiscoverRequest, SendMessageRequest, SwipeRequest};
pub use responses::{
    CuratedMatchesResponse, DiscoverResponse, ErrorResponse, HealthResponse, LikeActionResponse,
    LikeStatusResponse, MessageListResponse, MessageRequestListResponse, ProfileListResponse,
    SwipeResponse,
};
