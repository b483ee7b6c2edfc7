use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::CacheTier;

/// Last-seen content fingerprint of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentVersion {
    pub document_id: String,
    /// First 16 hex chars of the SHA-256 of the content.
    pub content_hash: String,
    pub last_updated: DateTime<Utc>,
    pub embedding_model_version: Option<String>,
}

impl DocumentVersion {
    pub fn new(
        document_id: impl Into<String>,
        content_hash: impl Into<String>,
        embedding_model_version: Option<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            content_hash: content_hash.into(),
            last_updated: Utc::now(),
            embedding_model_version,
        }
    }
}

/// Outcome of invalidating one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TierInvalidation {
    Removed { count: usize },
    Failed { reason: String },
}

impl TierInvalidation {
    /// Removed count, or `-1` for a failed tier.
    pub fn as_count(&self) -> i64 {
        match self {
            TierInvalidation::Removed { count } => *count as i64,
            TierInvalidation::Failed { .. } => -1,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TierInvalidation::Failed { .. })
    }
}

/// Per-tier results of one document-change event. Empty when the event was a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    pub tiers: BTreeMap<CacheTier, TierInvalidation>,
}

impl InvalidationReport {
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn get(&self, tier: CacheTier) -> Option<&TierInvalidation> {
        self.tiers.get(&tier)
    }

    /// Removed count for `tier` (`-1` if it failed), `None` if the tier was not invoked.
    pub fn count(&self, tier: CacheTier) -> Option<i64> {
        self.tiers.get(&tier).map(TierInvalidation::as_count)
    }

    /// Entries removed across all successful tiers.
    pub fn total_removed(&self) -> usize {
        self.tiers
            .values()
            .map(|t| match t {
                TierInvalidation::Removed { count } => *count,
                TierInvalidation::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn failed_tiers(&self) -> Vec<CacheTier> {
        self.tiers
            .iter()
            .filter(|(_, t)| t.is_failed())
            .map(|(tier, _)| *tier)
            .collect()
    }

    pub fn as_counts(&self) -> BTreeMap<CacheTier, i64> {
        self.tiers
            .iter()
            .map(|(tier, t)| (*tier, t.as_count()))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidationHealth {
    pub tracked_documents: usize,
    pub registered_tiers: Vec<CacheTier>,
    /// Number of fan-out events that reached the handlers.
    pub total_invalidations: u64,
    /// Entries removed across all fan-outs.
    pub entries_invalidated: u64,
    pub last_invalidation: Option<DateTime<Utc>>,
    pub embedding_model_version: Option<String>,
}
