use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by a cache tier.
pub enum CacheError {
    /// Query or entry embedding had no components.
    #[error("embedding is empty")]
    EmptyEmbedding,

    /// Embedding contained NaN or infinity.
    #[error("embedding component {index} is not finite")]
    NonFiniteEmbedding {
        /// Offending component index.
        index: usize,
    },

    /// Embedding length differs from the configured dimension.
    #[error("invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Configured dimension.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// Invalid configuration.
    #[error("invalid cache configuration: {reason}")]
    InvalidConfig {
        /// Error message.
        reason: String,
    },
}

/// Convenience result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
