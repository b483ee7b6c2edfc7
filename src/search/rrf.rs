//! Reciprocal rank fusion of dense and sparse result lists.

use std::collections::HashMap;

use tracing::debug;

use super::keywords::QueryKeywords;
use super::types::{DenseHit, HybridSearchResult, SearchMethod, SparseHit};
use crate::constants::{
    DEFAULT_DENSE_WEIGHT, DEFAULT_RRF_K, DEFAULT_SPARSE_PRIORITY_BOOST,
    DEFAULT_SPARSE_PRIORITY_THRESHOLD, DEFAULT_SPARSE_SCORE_NORMALIZER, DEFAULT_SPARSE_WEIGHT,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RrfConfig {
    /// Rank offset; larger values flatten the difference between top ranks.
    pub k: f32,
    /// `0.0` disables the dense leg.
    pub dense_weight: f32,
    /// `0.0` disables the sparse leg.
    pub sparse_weight: f32,
    /// Raw sparse scores above this get `sparse_priority_boost`.
    pub sparse_priority_threshold: f32,
    pub sparse_priority_boost: f32,
    /// Divisor applied to sparse scores when only the sparse leg answered.
    pub sparse_score_normalizer: f32,
}

impl Default for RrfConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_RRF_K,
            dense_weight: DEFAULT_DENSE_WEIGHT,
            sparse_weight: DEFAULT_SPARSE_WEIGHT,
            sparse_priority_threshold: DEFAULT_SPARSE_PRIORITY_THRESHOLD,
            sparse_priority_boost: DEFAULT_SPARSE_PRIORITY_BOOST,
            sparse_score_normalizer: DEFAULT_SPARSE_SCORE_NORMALIZER,
        }
    }
}

impl RrfConfig {
    pub fn with_weights(mut self, dense_weight: f32, sparse_weight: f32) -> Self {
        self.dense_weight = dense_weight;
        self.sparse_weight = sparse_weight;
        self
    }

    pub fn with_k(mut self, k: f32) -> Self {
        self.k = k;
        self
    }

    pub fn dense_enabled(&self) -> bool {
        self.dense_weight > 0.0
    }

    pub fn sparse_enabled(&self) -> bool {
        self.sparse_weight > 0.0
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.k.is_finite() || self.k < 0.0 {
            return Err(format!("k must be a finite value >= 0, got {}", self.k));
        }
        for (name, weight) in [
            ("dense_weight", self.dense_weight),
            ("sparse_weight", self.sparse_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("{name} must be a finite value >= 0, got {weight}"));
            }
        }
        if !self.sparse_priority_boost.is_finite() || self.sparse_priority_boost <= 0.0 {
            return Err(format!(
                "sparse_priority_boost must be > 0, got {}",
                self.sparse_priority_boost
            ));
        }
        if !self.sparse_score_normalizer.is_finite() || self.sparse_score_normalizer <= 0.0 {
            return Err(format!(
                "sparse_score_normalizer must be > 0, got {}",
                self.sparse_score_normalizer
            ));
        }
        Ok(())
    }
}

/// Pure rank-fusion over already-ranked candidate lists.
#[derive(Debug, Clone, Default)]
pub struct RrfReranker {
    config: RrfConfig,
}

impl RrfReranker {
    pub fn new(config: RrfConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RrfConfig {
        &self.config
    }

    /// Fuses whichever legs answered. `None` means the leg failed or was disabled.
    pub fn rerank(
        &self,
        query: &str,
        dense: Option<&[DenseHit]>,
        sparse: Option<&[SparseHit]>,
        limit: usize,
    ) -> Vec<HybridSearchResult> {
        match (dense, sparse) {
            (Some(dense), Some(sparse)) => self.fuse(query, dense, sparse, limit),
            (Some(dense), None) => self.dense_only(query, dense, limit),
            (None, Some(sparse)) => self.sparse_only(query, sparse, limit),
            (None, None) => Vec::new(),
        }
    }

    /// Weighted RRF over both lists, with title and sparse-priority boosts.
    ///
    /// Ties keep insertion order: dense order first, then sparse-only
    /// candidates in sparse order. A node repeated within one list keeps its
    /// best rank.
    pub fn fuse(
        &self,
        query: &str,
        dense: &[DenseHit],
        sparse: &[SparseHit],
        limit: usize,
    ) -> Vec<HybridSearchResult> {
        if limit == 0 {
            return Vec::new();
        }

        let mut fused: Vec<HybridSearchResult> = Vec::with_capacity(dense.len() + sparse.len());
        let mut positions: HashMap<&str, usize> = HashMap::with_capacity(fused.capacity());

        for (i, hit) in dense.iter().enumerate() {
            if positions.contains_key(hit.node_id.as_str()) {
                continue;
            }
            positions.insert(hit.node_id.as_str(), fused.len());
            fused.push(HybridSearchResult::from_dense(hit, i + 1, SearchMethod::Hybrid));
        }

        for (i, hit) in sparse.iter().enumerate() {
            let rank = i + 1;
            match positions.get(hit.node_id.as_str()) {
                Some(&pos) => {
                    if fused[pos].sparse_rank.is_none() {
                        fused[pos].merge_sparse(hit, rank);
                    }
                }
                None => {
                    positions.insert(hit.node_id.as_str(), fused.len());
                    fused.push(HybridSearchResult::from_sparse(hit, rank, SearchMethod::Hybrid));
                }
            }
        }

        let keywords = QueryKeywords::extract(query);
        for result in &mut fused {
            result.rrf_score = self.base_score(result.dense_rank, result.sparse_rank)
                * keywords.title_boost(&result.title)
                * self.sparse_boost(result.sparse_score);
        }

        let candidates = fused.len();
        let results = sort_and_truncate(fused, limit);
        debug!(
            dense = dense.len(),
            sparse = sparse.len(),
            candidates,
            returned = results.len(),
            "RRF fusion complete"
        );
        results
    }

    /// Ranks dense hits alone: `similarity × title boost`.
    pub fn dense_only(
        &self,
        query: &str,
        dense: &[DenseHit],
        limit: usize,
    ) -> Vec<HybridSearchResult> {
        let keywords = QueryKeywords::extract(query);
        let results = dense
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                let mut result = HybridSearchResult::from_dense(hit, i + 1, SearchMethod::DenseOnly);
                result.rrf_score = hit.similarity * keywords.title_boost(&result.title);
                result
            })
            .collect();
        sort_and_truncate(results, limit)
    }

    /// Ranks sparse hits alone: `score / normalizer × title boost`.
    pub fn sparse_only(
        &self,
        query: &str,
        sparse: &[SparseHit],
        limit: usize,
    ) -> Vec<HybridSearchResult> {
        let keywords = QueryKeywords::extract(query);
        let normalizer = self.config.sparse_score_normalizer;
        let results = sparse
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                let mut result =
                    HybridSearchResult::from_sparse(hit, i + 1, SearchMethod::SparseOnly);
                result.rrf_score = hit.score / normalizer * keywords.title_boost(&hit.title);
                result
            })
            .collect();
        sort_and_truncate(results, limit)
    }

    /// `w_d / (k + rank_d) + w_s / (k + rank_s)`, absent ranks contributing 0.
    pub fn base_score(&self, dense_rank: Option<usize>, sparse_rank: Option<usize>) -> f32 {
        let k = self.config.k;
        let dense = dense_rank.map_or(0.0, |r| self.config.dense_weight / (k + r as f32));
        let sparse = sparse_rank.map_or(0.0, |r| self.config.sparse_weight / (k + r as f32));
        dense + sparse
    }

    fn sparse_boost(&self, sparse_score: Option<f32>) -> f32 {
        match sparse_score {
            Some(score) if score > self.config.sparse_priority_threshold => {
                self.config.sparse_priority_boost
            }
            _ => 1.0,
        }
    }
}

fn sort_and_truncate(
    mut results: Vec<HybridSearchResult>,
    limit: usize,
) -> Vec<HybridSearchResult> {
    // Stable: equal scores keep insertion order.
    results.sort_by(|a, b| b.rrf_score.total_cmp(&a.rrf_score));
    results.truncate(limit);
    results
}
