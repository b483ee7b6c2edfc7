//! Cache façade: response tier + invalidation behind a circuit breaker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time;
use tracing::{debug, instrument, warn};

use super::circuit::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats};
use super::config::CacheConfig;
use super::error::CacheResult;
use super::semantic::SemanticResponseCache;
use super::types::{CacheLookupResult, CacheStats, CacheTier};
use crate::invalidation::{
    CacheInvalidationManager, InvalidationHandler, InvalidationHealth, InvalidationReport,
};

/// Snapshot returned by [`CacheManager::get_stats`].
#[derive(Debug, Clone, Serialize)]
pub struct CacheManagerStats {
    pub total_requests: u64,
    /// Requests answered without touching the cache because the circuit was open.
    pub bypassed_requests: u64,
    /// Cache operations that returned an error.
    pub failed_operations: u64,
    pub circuit: CircuitBreakerStats,
    pub response: CacheStats,
    pub invalidation: InvalidationHealth,
}

/// Entry point for cache reads/writes and document-change events.
///
/// Construct one per service and share it behind an `Arc`. Errors from the
/// cache never reach the caller: reads degrade to a miss, writes to `false`.
pub struct CacheManager<V> {
    response_cache: Arc<SemanticResponseCache<V>>,
    invalidation: CacheInvalidationManager,
    breaker: CircuitBreaker,
    total_requests: AtomicU64,
    bypassed_requests: AtomicU64,
    failed_operations: AtomicU64,
}

impl<V> std::fmt::Debug for CacheManager<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("response_cache", &self.response_cache)
            .field("invalidation", &self.invalidation)
            .field("breaker", &self.breaker.state())
            .finish_non_exhaustive()
    }
}

impl<V> CacheManager<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Builds the response tier and registers it for document invalidation.
    pub fn new(config: CacheConfig, breaker_config: CircuitBreakerConfig) -> CacheResult<Self> {
        let response_cache = Arc::new(SemanticResponseCache::new(config)?);
        let invalidation = CacheInvalidationManager::new();
        invalidation.register_handler(
            CacheTier::Response,
            Arc::clone(&response_cache) as Arc<dyn InvalidationHandler>,
        );

        Ok(Self {
            response_cache,
            invalidation,
            breaker: CircuitBreaker::new(breaker_config),
            total_requests: AtomicU64::new(0),
            bypassed_requests: AtomicU64::new(0),
            failed_operations: AtomicU64::new(0),
        })
    }

    pub fn with_defaults() -> CacheResult<Self> {
        Self::new(CacheConfig::default(), CircuitBreakerConfig::default())
    }

    pub fn response_cache(&self) -> &Arc<SemanticResponseCache<V>> {
        &self.response_cache
    }

    pub fn invalidation(&self) -> &CacheInvalidationManager {
        &self.invalidation
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Semantic lookup. Open circuit or cache error → miss.
    pub fn get(&self, query: &str, embedding: &[f32]) -> CacheLookupResult<V> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        let tier = self.response_cache.tier();

        match self
            .breaker
            .call(|| self.response_cache.get(query, embedding))
        {
            Some(Ok(result)) => result,
            Some(Err(e)) => {
                self.failed_operations.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, query_len = query.len(), "Cache lookup failed, treating as miss");
                CacheLookupResult::miss(tier, Duration::ZERO)
            }
            None => {
                self.bypassed_requests.fetch_add(1, Ordering::Relaxed);
                debug!("Circuit open, bypassing cache lookup");
                CacheLookupResult::miss(tier, Duration::ZERO)
            }
        }
    }

    /// Stores a generated answer. Returns `true` if it was stored.
    pub fn set<I, S>(
        &self,
        query: &str,
        embedding: Vec<f32>,
        value: V,
        document_ids: I,
        metadata: Map<String, Value>,
    ) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        match self.breaker.call(|| {
            self.response_cache
                .set(query, embedding, value, document_ids, metadata)
        }) {
            Some(Ok(stored)) => stored,
            Some(Err(e)) => {
                self.failed_operations.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, query_len = query.len(), "Cache write failed");
                false
            }
            None => {
                self.bypassed_requests.fetch_add(1, Ordering::Relaxed);
                debug!("Circuit open, skipping cache write");
                false
            }
        }
    }

    /// Drops every cached entry derived from `document_id`, in all tiers.
    #[instrument(skip(self))]
    pub async fn invalidate_document(&self, document_id: &str) -> InvalidationReport {
        self.invalidation.invalidate(document_id).await
    }

    pub async fn on_document_updated(&self, document_id: &str, content: &str) -> InvalidationReport {
        self.invalidation
            .on_document_updated(document_id, content)
            .await
    }

    pub async fn on_document_deleted(&self, document_id: &str) -> InvalidationReport {
        self.invalidation.on_document_deleted(document_id).await
    }

    /// Clears the response tier when the embedding model version changes.
    pub fn on_embeddings_refreshed(&self, new_version: &str) -> bool {
        let cache = Arc::clone(&self.response_cache);
        let clear = move || cache.clear();
        self.invalidation
            .on_embeddings_refreshed(new_version, Some(&clear))
    }

    /// Registers the invalidation handler of another tier.
    pub fn register_handler(&self, tier: CacheTier, handler: Arc<dyn InvalidationHandler>) {
        self.invalidation.register_handler(tier, handler);
    }

    pub fn get_stats(&self) -> CacheManagerStats {
        CacheManagerStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            bypassed_requests: self.bypassed_requests.load(Ordering::Relaxed),
            failed_operations: self.failed_operations.load(Ordering::Relaxed),
            circuit: self.breaker.stats(),
            response: self.response_cache.stats(),
            invalidation: self.invalidation.get_health(),
        }
    }

    pub fn purge_expired(&self) -> usize {
        self.response_cache.purge_expired()
    }

    /// Returns the manager to its freshly-constructed state. Registered handlers are kept.
    pub fn reset(&self) {
        self.response_cache.clear();
        self.response_cache.reset_stats();
        self.invalidation.reset();
        self.breaker.reset();
        self.total_requests.store(0, Ordering::Relaxed);
        self.bypassed_requests.store(0, Ordering::Relaxed);
        self.failed_operations.store(0, Ordering::Relaxed);
    }

    /// Periodically purges expired entries until the manager is dropped.
    pub fn start_expiry_sweeper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let manager: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                let purged = manager.purge_expired();
                if purged > 0 {
                    debug!(purged, "Expiry sweep removed entries");
                }
            }
        })
    }
}
