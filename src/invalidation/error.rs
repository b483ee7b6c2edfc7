use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum InvalidationError {
    #[error("invalidation handler failed: {0}")]
    HandlerFailed(String),

    #[error("cache tier unavailable: {reason}")]
    TierUnavailable { reason: String },
}

pub type InvalidationResult<T> = Result<T, InvalidationError>;
