use std::time::Duration;

use super::types::CacheTier;
use crate::constants::{
    DEFAULT_EMBEDDING_MAX_ENTRIES, DEFAULT_EMBEDDING_TTL_SECS, DEFAULT_RESPONSE_MAX_ENTRIES,
    DEFAULT_RESPONSE_TTL_SECS, DEFAULT_RETRIEVAL_MAX_ENTRIES, DEFAULT_RETRIEVAL_TTL_SECS,
    DEFAULT_SIMILARITY_THRESHOLD,
};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Minimum cosine similarity for a hit (inclusive).
    pub similarity_threshold: f32,
    pub response_ttl: Duration,
    pub retrieval_ttl: Duration,
    pub embedding_ttl: Duration,
    pub response_max_entries: usize,
    pub retrieval_max_entries: usize,
    pub embedding_max_entries: usize,
    pub enabled: bool,
    /// Emit hit/miss lines at `info` level.
    pub log_cache_operations: bool,
    /// When set, embeddings of any other length are rejected.
    pub embedding_dim: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            response_ttl: Duration::from_secs(DEFAULT_RESPONSE_TTL_SECS),
            retrieval_ttl: Duration::from_secs(DEFAULT_RETRIEVAL_TTL_SECS),
            embedding_ttl: Duration::from_secs(DEFAULT_EMBEDDING_TTL_SECS),
            response_max_entries: DEFAULT_RESPONSE_MAX_ENTRIES,
            retrieval_max_entries: DEFAULT_RETRIEVAL_MAX_ENTRIES,
            embedding_max_entries: DEFAULT_EMBEDDING_MAX_ENTRIES,
            enabled: true,
            log_cache_operations: false,
            embedding_dim: None,
        }
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_ttl(mut self, tier: CacheTier, ttl: Duration) -> Self {
        match tier {
            CacheTier::Response => self.response_ttl = ttl,
            CacheTier::Retrieval => self.retrieval_ttl = ttl,
            CacheTier::Embedding => self.embedding_ttl = ttl,
        }
        self
    }

    pub fn with_max_entries(mut self, tier: CacheTier, max_entries: usize) -> Self {
        match tier {
            CacheTier::Response => self.response_max_entries = max_entries,
            CacheTier::Retrieval => self.retrieval_max_entries = max_entries,
            CacheTier::Embedding => self.embedding_max_entries = max_entries,
        }
        self
    }

    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = Some(dim);
        self
    }

    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.log_cache_operations = enabled;
        self
    }

    pub fn ttl_for(&self, tier: CacheTier) -> Duration {
        match tier {
            CacheTier::Response => self.response_ttl,
            CacheTier::Retrieval => self.retrieval_ttl,
            CacheTier::Embedding => self.embedding_ttl,
        }
    }

    pub fn max_entries_for(&self, tier: CacheTier) -> usize {
        match tier {
            CacheTier::Response => self.response_max_entries,
            CacheTier::Retrieval => self.retrieval_max_entries,
            CacheTier::Embedding => self.embedding_max_entries,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(format!(
                "similarity_threshold must be in (0.0, 1.0], got {}",
                self.similarity_threshold
            ));
        }

        for tier in CacheTier::ALL {
            if self.max_entries_for(tier) == 0 {
                return Err(format!("{tier} max_entries must be > 0"));
            }
            if self.ttl_for(tier).is_zero() {
                return Err(format!("{tier} ttl must be > 0"));
            }
        }

        if self.embedding_dim == Some(0) {
            return Err("embedding_dim cannot be 0 when provided".to_string());
        }

        Ok(())
    }
}
