//! Semantic cache tiers, circuit breaker and the [`CacheManager`] façade.

pub mod circuit;
pub mod config;
pub mod error;
pub mod manager;
pub mod semantic;
pub mod similarity;
pub mod types;

#[cfg(test)]
mod manager_tests;
#[cfg(test)]
mod semantic_tests;

pub use circuit::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use manager::{CacheManager, CacheManagerStats};
pub use semantic::SemanticResponseCache;
pub use similarity::{cosine_similarity, validate_embedding};
pub use types::{CacheEntry, CacheLookupResult, CacheStats, CacheTier};
