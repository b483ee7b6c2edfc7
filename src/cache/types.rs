use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::SIMILARITY_EMA_ALPHA;

/// Cache tiers. Each tier has its own TTL, capacity, stats and invalidation handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheTier {
    Response,
    Retrieval,
    Embedding,
}

impl CacheTier {
    pub const ALL: [CacheTier; 3] = [
        CacheTier::Response,
        CacheTier::Retrieval,
        CacheTier::Embedding,
    ];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTier::Response => "response",
            CacheTier::Retrieval => "retrieval",
            CacheTier::Embedding => "embedding",
        }
    }
}

impl std::fmt::Display for CacheTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cached value plus the embedding it was stored under.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Original query text.
    pub key: String,
    pub embedding: Vec<f32>,
    pub value: V,
    pub tier: CacheTier,
    pub created_at: Instant,
    pub last_accessed: Instant,
    pub ttl: Duration,
    pub access_count: u64,
    /// Documents this entry was derived from; joined against on invalidation.
    pub document_ids: HashSet<String>,
    pub metadata: Map<String, Value>,
}

impl<V> CacheEntry<V> {
    pub fn new(
        key: impl Into<String>,
        embedding: Vec<f32>,
        value: V,
        tier: CacheTier,
        ttl: Duration,
    ) -> Self {
        let now = Instant::now();
        Self {
            key: key.into(),
            embedding,
            value,
            tier,
            created_at: now,
            last_accessed: now,
            ttl,
            access_count: 0,
            document_ids: HashSet::new(),
            metadata: Map::new(),
        }
    }

    pub fn with_document_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.document_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > self.ttl
    }

    /// Records a hit.
    #[inline]
    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
        self.access_count += 1;
    }

    #[inline]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    #[inline]
    pub fn references_document(&self, document_id: &str) -> bool {
        self.document_ids.contains(document_id)
    }
}

/// Per-tier counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
    pub expirations: u64,
    /// Exponential moving average of the similarity observed on hits.
    pub avg_similarity: f32,
}

impl CacheStats {
    pub(crate) fn record_hit(&mut self, similarity: f32) {
        if self.hits == 0 {
            self.avg_similarity = similarity;
        } else {
            self.avg_similarity =
                SIMILARITY_EMA_ALPHA * similarity + (1.0 - SIMILARITY_EMA_ALPHA) * self.avg_similarity;
        }
        self.hits += 1;
    }

    #[inline]
    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups that hit; `0.0` before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            n => self.hits as f64 / n as f64,
        }
    }
}

/// Result of a semantic lookup.
#[derive(Debug, Clone)]
pub struct CacheLookupResult<V> {
    pub hit: bool,
    pub entry: Option<CacheEntry<V>>,
    /// Cosine similarity of the matched entry; `0.0` on a miss.
    pub similarity: f32,
    pub tier: CacheTier,
    pub lookup_time: Duration,
}

impl<V> CacheLookupResult<V> {
    pub fn hit(entry: CacheEntry<V>, similarity: f32, lookup_time: Duration) -> Self {
        Self {
            hit: true,
            tier: entry.tier,
            entry: Some(entry),
            similarity,
            lookup_time,
        }
    }

    pub fn miss(tier: CacheTier, lookup_time: Duration) -> Self {
        Self {
            hit: false,
            entry: None,
            similarity: 0.0,
            tier,
            lookup_time,
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.hit
    }

    pub fn value(&self) -> Option<&V> {
        self.entry.as_ref().map(|e| &e.value)
    }

    pub fn into_value(self) -> Option<V> {
        self.entry.map(|e| e.value)
    }
}
