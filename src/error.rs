use thiserror::Error;

use crate::services::StoreError;

/// Failures surfaced by the discovery core.
///
/// None of these are fatal: each one means the operation did not complete and
/// prior state is left intact.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("user not authenticated")]
    Unauthenticated,

    #[error("already processing")]
    Conflict,

    /// Details stay in the source for logging; callers only see the generic message.
    #[error("failed to process action")]
    Store(#[from] StoreError),

    #[error("no likes remaining")]
    QuotaExhausted,

    #[error("premium membership required")]
    PremiumRequired,

    #[error("like workflow closed")]
    Closed,

    #[error("{0} not found")]
    NotFound(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
