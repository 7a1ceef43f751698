// Core algorithm exports
pub mod age;
pub mod curator;
pub mod filters;
pub mod likes;
pub mod messaging;
pub mod scoring;
pub mod session;

pub use age::{calculate_age, DEFAULT_AGE};
pub use curator::{CurationResult, Curator};
pub use filters::{
    apply_all_filters, filter_by_age, filter_by_civil_status, filter_by_gender, filter_by_religion,
};
pub use likes::{LikeAction, LikeState, LikeWorkflow};
pub use messaging::{MessageRequest, Messenger};
pub use scoring::{calculate_final_score, calculate_score_components, ScoringWeights};
pub use session::{Discovery, DiscoverySession, SwipeOutcome};
