use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use super::handler::InvalidationHandler;
use super::types::{DocumentVersion, InvalidationHealth, InvalidationReport, TierInvalidation};
use crate::cache::CacheTier;
use crate::hashing::content_hash;

/// Tracks document content versions and fans document changes out to cache tiers.
pub struct CacheInvalidationManager {
    handlers: RwLock<BTreeMap<CacheTier, Arc<dyn InvalidationHandler>>>,
    versions: RwLock<HashMap<String, DocumentVersion>>,
    embedding_model_version: RwLock<Option<String>>,
    total_invalidations: AtomicU64,
    entries_invalidated: AtomicU64,
    last_invalidation: Mutex<Option<DateTime<Utc>>>,
}

impl std::fmt::Debug for CacheInvalidationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheInvalidationManager")
            .field("tiers", &self.registered_tiers())
            .field("tracked_documents", &self.versions.read().len())
            .finish_non_exhaustive()
    }
}

impl Default for CacheInvalidationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheInvalidationManager {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(BTreeMap::new()),
            versions: RwLock::new(HashMap::new()),
            embedding_model_version: RwLock::new(None),
            total_invalidations: AtomicU64::new(0),
            entries_invalidated: AtomicU64::new(0),
            last_invalidation: Mutex::new(None),
        }
    }

    /// Registers the handler for `tier`, replacing any previous one.
    pub fn register_handler(&self, tier: CacheTier, handler: Arc<dyn InvalidationHandler>) {
        if self.handlers.write().insert(tier, handler).is_some() {
            debug!(%tier, "Replaced invalidation handler");
        } else {
            debug!(%tier, "Registered invalidation handler");
        }
    }

    pub fn unregister_handler(&self, tier: CacheTier) -> bool {
        self.handlers.write().remove(&tier).is_some()
    }

    pub fn registered_tiers(&self) -> Vec<CacheTier> {
        self.handlers.read().keys().copied().collect()
    }

    /// Handles a content change for `document_id`.
    ///
    /// Content identical to the tracked version is a no-op and returns an empty
    /// report. Otherwise every tier is invalidated and the tracked version is
    /// replaced, even if some handlers failed.
    #[instrument(skip(self, new_content), fields(content_len = new_content.len()))]
    pub async fn on_document_updated(
        &self,
        document_id: &str,
        new_content: &str,
    ) -> InvalidationReport {
        let hash = content_hash(new_content);

        let unchanged = self
            .versions
            .read()
            .get(document_id)
            .is_some_and(|v| v.content_hash == hash);
        if unchanged {
            debug!(content_hash = %hash, "Document content unchanged, skipping invalidation");
            return InvalidationReport::default();
        }

        let report = self.invalidate(document_id).await;

        let model_version = self.embedding_model_version.read().clone();
        self.versions.write().insert(
            document_id.to_string(),
            DocumentVersion::new(document_id, hash, model_version),
        );

        report
    }

    /// Invalidates all tiers for a removed document and forgets its version.
    #[instrument(skip(self))]
    pub async fn on_document_deleted(&self, document_id: &str) -> InvalidationReport {
        let report = self.invalidate(document_id).await;
        self.versions.write().remove(document_id);
        report
    }

    /// Records a new embedding model version, running `clear` when it changed.
    ///
    /// Returns `false` if `new_version` is already the tracked version.
    pub fn on_embeddings_refreshed(
        &self,
        new_version: &str,
        clear: Option<&dyn Fn() -> usize>,
    ) -> bool {
        let mut current = self.embedding_model_version.write();
        if current.as_deref() == Some(new_version) {
            debug!(version = new_version, "Embedding model version unchanged");
            return false;
        }

        let cleared = clear.map(|f| f());
        info!(
            previous = current.as_deref().unwrap_or("none"),
            version = new_version,
            cleared,
            "Embedding model refreshed"
        );
        *current = Some(new_version.to_string());
        true
    }

    /// Invokes every registered handler for `document_id` without touching version tracking.
    ///
    /// Handlers run concurrently. A failing handler is reported for its tier
    /// and does not affect the others.
    pub async fn invalidate(&self, document_id: &str) -> InvalidationReport {
        let handlers: Vec<(CacheTier, Arc<dyn InvalidationHandler>)> = self
            .handlers
            .read()
            .iter()
            .map(|(tier, handler)| (*tier, Arc::clone(handler)))
            .collect();

        let outcomes = join_all(handlers.into_iter().map(|(tier, handler)| async move {
            (tier, handler.invalidate_document(document_id).await)
        }))
        .await;

        let mut report = InvalidationReport::default();
        for (tier, outcome) in outcomes {
            let result = match outcome {
                Ok(count) => TierInvalidation::Removed { count },
                Err(e) => {
                    warn!(%tier, document_id, error = %e, "Invalidation handler failed");
                    TierInvalidation::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            report.tiers.insert(tier, result);
        }

        self.total_invalidations.fetch_add(1, Ordering::Relaxed);
        self.entries_invalidated
            .fetch_add(report.total_removed() as u64, Ordering::Relaxed);
        *self.last_invalidation.lock() = Some(Utc::now());

        info!(
            document_id,
            removed = report.total_removed(),
            failed = report.failed_tiers().len(),
            "Document invalidation complete"
        );

        report
    }

    pub fn document_version(&self, document_id: &str) -> Option<DocumentVersion> {
        self.versions.read().get(document_id).cloned()
    }

    pub fn embedding_model_version(&self) -> Option<String> {
        self.embedding_model_version.read().clone()
    }

    pub fn get_health(&self) -> InvalidationHealth {
        InvalidationHealth {
            tracked_documents: self.versions.read().len(),
            registered_tiers: self.registered_tiers(),
            total_invalidations: self.total_invalidations.load(Ordering::Relaxed),
            entries_invalidated: self.entries_invalidated.load(Ordering::Relaxed),
            last_invalidation: *self.last_invalidation.lock(),
            embedding_model_version: self.embedding_model_version.read().clone(),
        }
    }

    /// Forgets tracked versions and counters. Registered handlers are kept.
    pub fn reset(&self) {
        self.versions.write().clear();
        *self.embedding_model_version.write() = None;
        self.total_invalidations.store(0, Ordering::Relaxed);
        self.entries_invalidated.store(0, Ordering::Relaxed);
        *self.last_invalidation.lock() = None;
    }
}
