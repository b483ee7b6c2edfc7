use thiserror::Error;

/// The external call a [`SearchError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLeg {
    Dense,
    Sparse,
    Rerank,
}

impl std::fmt::Display for SearchLeg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SearchLeg::Dense => "dense",
            SearchLeg::Sparse => "sparse",
            SearchLeg::Rerank => "rerank",
        })
    }
}

#[derive(Debug, Error)]
/// Errors returned by search collaborators.
pub enum SearchError {
    /// Query embedding failed.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// Dense index query failed.
    #[error("dense index query failed: {0}")]
    DenseIndex(String),

    /// Sparse index query failed.
    #[error("sparse index query failed: {0}")]
    SparseIndex(String),

    /// Cross-encoder call failed.
    #[error("reranker failed: {0}")]
    Reranker(String),

    /// A leg did not answer within its timeout.
    #[error("{leg} leg timed out after {timeout_ms}ms")]
    Timeout {
        /// Leg that timed out.
        leg: SearchLeg,
        /// Configured timeout.
        timeout_ms: u64,
    },
}

impl SearchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SearchError::Timeout { .. })
    }
}
