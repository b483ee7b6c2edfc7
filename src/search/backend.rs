//! Collaborator interfaces for the hybrid search legs.

use std::future::Future;

use super::error::SearchError;
use super::types::{DenseHit, SparseHit};

/// Turns text into a fixed-length vector. Must be deterministic.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, SearchError>> + Send;
}

/// Vector similarity index.
pub trait DenseIndex: Send + Sync {
    /// Returns up to `limit` hits, most similar first.
    fn search(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> impl Future<Output = Result<Vec<DenseHit>, SearchError>> + Send;
}

/// Keyword / full-text index.
pub trait SparseIndex: Send + Sync {
    /// Returns up to `limit` hits, highest score first.
    fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<SparseHit>, SearchError>> + Send;
}

/// Second-stage relevance model.
pub trait CrossEncoder: Send + Sync {
    /// Scores `candidates` against `query`.
    ///
    /// Returns `(candidate index, relevance)` pairs for at most `top_k`
    /// candidates. Order is not significant; callers sort by relevance.
    fn rerank(
        &self,
        query: &str,
        candidates: &[&str],
        top_k: usize,
    ) -> impl Future<Output = Result<Vec<(usize, f32)>, SearchError>> + Send;
}
