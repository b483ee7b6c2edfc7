//! Hermes: query-time latency path for a retrieval-augmented QA service.
//!
//! # Public API Surface
//!
//! ## Cache
//! - [`CacheManager`] - Circuit-breaker-guarded façade; the usual entry point
//! - [`SemanticResponseCache`] - One similarity-keyed tier (TTL + strict LRU)
//! - [`CircuitBreaker`], [`CircuitBreakerConfig`] - Failure isolation
//! - [`CacheConfig`], [`CacheEntry`], [`CacheLookupResult`], [`CacheStats`], [`CacheTier`]
//!
//! ## Invalidation
//! - [`CacheInvalidationManager`] - Document versions and per-tier fan-out
//! - [`InvalidationHandler`] - Capability each tier implements
//!
//! ## Search
//! - [`HybridSearchService`] - Concurrent dense + sparse retrieval
//! - [`RrfReranker`], [`RrfConfig`] - Rank fusion with title boosting
//! - [`EmbeddingProvider`], [`DenseIndex`], [`SparseIndex`], [`CrossEncoder`] - Collaborators
//!
//! ## Routing
//! - [`AdaptivePipelineRouter`], [`RouterConfig`], [`RoutingDecision`]
//!
//! ## Configuration
//! - [`Config`], [`ConfigError`] - `HERMES_*` environment overrides
//!
//! ## Test/Mock Support
//! Mock collaborators are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod hashing;
pub mod invalidation;
pub mod routing;
pub mod search;

pub use cache::{
    CacheConfig, CacheEntry, CacheError, CacheLookupResult, CacheManager, CacheManagerStats,
    CacheResult, CacheStats, CacheTier, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats,
    CircuitState, SemanticResponseCache, cosine_similarity,
};
pub use config::{Config, ConfigError};
pub use hashing::{content_hash, hash_query};
pub use invalidation::{
    CacheInvalidationManager, DocumentVersion, FnHandler, InvalidationError, InvalidationHandler,
    InvalidationHealth, InvalidationReport, InvalidationResult, TierInvalidation,
};
pub use routing::{
    AdaptivePipelineRouter, CacheSignal, ExecutionPath, QueryComplexity, RouterConfig,
    RoutingDecision,
};
#[cfg(any(test, feature = "mock"))]
pub use search::{MockCrossEncoder, MockDenseIndex, MockDocument, MockEmbedder, MockSparseIndex};
pub use search::{
    CrossEncoder, DenseHit, DenseIndex, EmbeddingProvider, HybridSearchConfig,
    HybridSearchResult, HybridSearchService, RrfConfig, RrfReranker, SearchError, SearchLeg,
    SearchMethod, SparseHit, SparseIndex,
};
