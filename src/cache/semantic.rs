//! Similarity-keyed cache tier (in-memory).
//!
//! Entries are stored under a BLAKE3 hash of the query text. Lookups scan every
//! live entry and return the closest one whose cosine similarity clears the
//! configured threshold. Capacity is enforced with strict LRU eviction.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::config::CacheConfig;
use super::error::{CacheError, CacheResult};
use super::similarity::{cosine_similarity, validate_embedding};
use super::types::{CacheEntry, CacheLookupResult, CacheStats, CacheTier};
use crate::hashing::hash_query;
use crate::invalidation::{InvalidationError, InvalidationHandler};

struct Slot<V> {
    entry: CacheEntry<V>,
    /// Position in the recency order; larger is more recent.
    tick: u64,
}

struct CacheState<V> {
    entries: HashMap<[u8; 32], Slot<V>>,
    recency: BTreeMap<u64, [u8; 32]>,
    next_tick: u64,
    stats: CacheStats,
}

impl<V> CacheState<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            next_tick: 0,
            stats: CacheStats::default(),
        }
    }

    fn bump_tick(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    fn remove(&mut self, key: &[u8; 32]) -> Option<CacheEntry<V>> {
        let slot = self.entries.remove(key)?;
        self.recency.remove(&slot.tick);
        Some(slot.entry)
    }

    fn promote(&mut self, key: &[u8; 32]) {
        let tick = self.bump_tick();
        if let Some(slot) = self.entries.get_mut(key) {
            self.recency.remove(&slot.tick);
            slot.tick = tick;
            self.recency.insert(tick, *key);
        }
    }

    fn evict_lru(&mut self) -> Option<CacheEntry<V>> {
        let (_, key) = self.recency.pop_first()?;
        self.entries.remove(&key).map(|slot| slot.entry)
    }

    fn drop_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<[u8; 32]> = self
            .entries
            .iter()
            .filter(|(_, slot)| slot.entry.is_expired_at(now))
            .map(|(key, _)| *key)
            .collect();

        for key in &expired {
            self.remove(key);
        }
        self.stats.expirations += expired.len() as u64;
        expired.len()
    }
}

/// One cache tier: similarity lookup, TTL expiry and LRU eviction.
pub struct SemanticResponseCache<V> {
    tier: CacheTier,
    config: CacheConfig,
    ttl: Duration,
    max_entries: usize,
    state: Mutex<CacheState<V>>,
}

impl<V> std::fmt::Debug for SemanticResponseCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticResponseCache")
            .field("tier", &self.tier)
            .field("entries", &self.state.lock().entries.len())
            .field("max_entries", &self.max_entries)
            .field("threshold", &self.config.similarity_threshold)
            .finish()
    }
}

impl<V: Clone> SemanticResponseCache<V> {
    /// Creates the response tier.
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        Self::for_tier(CacheTier::Response, config)
    }

    /// Creates a cache for `tier`, taking its TTL and capacity from `config`.
    pub fn for_tier(tier: CacheTier, config: CacheConfig) -> CacheResult<Self> {
        config
            .validate()
            .map_err(|reason| CacheError::InvalidConfig { reason })?;

        Ok(Self {
            tier,
            ttl: config.ttl_for(tier),
            max_entries: config.max_entries_for(tier),
            config,
            state: Mutex::new(CacheState::new()),
        })
    }

    pub fn tier(&self) -> CacheTier {
        self.tier
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Finds the most similar live entry at or above the threshold.
    ///
    /// Expired entries met during the scan are dropped. On similarity ties the
    /// most recently used entry wins.
    pub fn get(&self, query: &str, embedding: &[f32]) -> CacheResult<CacheLookupResult<V>> {
        let start = Instant::now();

        if !self.config.enabled {
            return Ok(CacheLookupResult::miss(self.tier, start.elapsed()));
        }

        validate_embedding(embedding, self.config.embedding_dim)?;

        let threshold = self.config.similarity_threshold;
        let mut state = self.state.lock();

        let expired = state.drop_expired(Instant::now());
        if expired > 0 {
            debug!(tier = %self.tier, expired, "Dropped expired entries during lookup");
        }

        let mut best: Option<([u8; 32], f32, u64)> = None;
        for (key, slot) in &state.entries {
            let similarity = cosine_similarity(embedding, &slot.entry.embedding);
            if similarity < threshold {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, best_sim, best_tick)) => {
                    similarity > best_sim || (similarity == best_sim && slot.tick > best_tick)
                }
            };
            if better {
                best = Some((*key, similarity, slot.tick));
            }
        }

        let Some((key, similarity, _)) = best else {
            state.stats.record_miss();
            drop(state);

            if self.config.log_cache_operations {
                info!(tier = %self.tier, query_len = query.len(), "Cache miss");
            } else {
                debug!(tier = %self.tier, query_len = query.len(), "Cache miss");
            }
            return Ok(CacheLookupResult::miss(self.tier, start.elapsed()));
        };

        let Some(slot) = state.entries.get_mut(&key) else {
            state.stats.record_miss();
            return Ok(CacheLookupResult::miss(self.tier, start.elapsed()));
        };
        slot.entry.touch();
        let entry = slot.entry.clone();
        state.promote(&key);
        state.stats.record_hit(similarity);
        drop(state);

        if self.config.log_cache_operations {
            info!(
                tier = %self.tier,
                similarity,
                access_count = entry.access_count,
                "Cache hit"
            );
        } else {
            debug!(tier = %self.tier, similarity, "Cache hit");
        }

        Ok(CacheLookupResult::hit(entry, similarity, start.elapsed()))
    }

    /// Stores `value` under `query`, replacing any previous entry for the same query.
    ///
    /// Returns `Ok(false)` when the cache is disabled.
    pub fn set<I, S>(
        &self,
        query: &str,
        embedding: Vec<f32>,
        value: V,
        document_ids: I,
        metadata: Map<String, Value>,
    ) -> CacheResult<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.config.enabled {
            return Ok(false);
        }

        validate_embedding(&embedding, self.config.embedding_dim)?;

        let key = hash_query(query);
        let entry = CacheEntry::new(query, embedding, value, self.tier, self.ttl)
            .with_document_ids(document_ids)
            .with_metadata(metadata);

        let mut state = self.state.lock();
        let replaced = state.remove(&key).is_some();

        let mut evicted = 0u64;
        while state.entries.len() >= self.max_entries {
            if state.evict_lru().is_none() {
                break;
            }
            evicted += 1;
        }
        state.stats.evictions += evicted;

        let tick = state.bump_tick();
        state.recency.insert(tick, key);
        state.entries.insert(key, Slot { entry, tick });
        let total = state.entries.len();
        drop(state);

        if self.config.log_cache_operations {
            info!(tier = %self.tier, replaced, evicted, total, "Cache set");
        } else {
            debug!(tier = %self.tier, replaced, evicted, total, "Cache set");
        }

        Ok(true)
    }

    /// Removes every entry derived from `document_id`.
    pub fn invalidate_by_document(&self, document_id: &str) -> usize {
        let mut state = self.state.lock();
        let keys: Vec<[u8; 32]> = state
            .entries
            .iter()
            .filter(|(_, slot)| slot.entry.references_document(document_id))
            .map(|(key, _)| *key)
            .collect();

        for key in &keys {
            state.remove(key);
        }
        state.stats.invalidations += keys.len() as u64;

        if !keys.is_empty() {
            debug!(tier = %self.tier, document_id, removed = keys.len(), "Invalidated entries");
        }
        keys.len()
    }

    /// Removes the entry stored for exactly `query`.
    pub fn remove(&self, query: &str) -> bool {
        self.state.lock().remove(&hash_query(query)).is_some()
    }

    pub fn contains(&self, query: &str) -> bool {
        self.state.lock().entries.contains_key(&hash_query(query))
    }

    /// Eagerly drops all expired entries.
    pub fn purge_expired(&self) -> usize {
        self.state.lock().drop_expired(Instant::now())
    }

    /// Removes all entries and returns how many there were.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let removed = state.entries.len();
        state.entries.clear();
        state.recency.clear();
        removed
    }

    /// Snapshot of the counters, with `total_entries` filled in.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            total_entries: state.entries.len(),
            ..state.stats.clone()
        }
    }

    pub fn reset_stats(&self) {
        self.state.lock().stats = CacheStats::default();
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<V> InvalidationHandler for SemanticResponseCache<V>
where
    V: Clone + Send + Sync,
{
    async fn invalidate_document(&self, document_id: &str) -> Result<usize, InvalidationError> {
        Ok(self.invalidate_by_document(document_id))
    }
}
