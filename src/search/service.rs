use std::time::Duration;

use tokio::time;
use tracing::{debug, error, info, instrument, warn};

use super::backend::{CrossEncoder, DenseIndex, EmbeddingProvider, SparseIndex};
use super::error::{SearchError, SearchLeg};
use super::rrf::{RrfConfig, RrfReranker};
use super::types::{DenseHit, HybridSearchResult, SparseHit};
use crate::constants::{DEFAULT_SEARCH_TIMEOUT_MS, SEARCH_OVERFETCH_FACTOR};

#[derive(Debug, Clone)]
pub struct HybridSearchConfig {
    pub rrf: RrfConfig,
    /// Applied to each leg and to the cross-encoder call independently.
    pub leg_timeout: Duration,
}

impl Default for HybridSearchConfig {
    fn default() -> Self {
        Self {
            rrf: RrfConfig::default(),
            leg_timeout: Duration::from_millis(DEFAULT_SEARCH_TIMEOUT_MS),
        }
    }
}

impl HybridSearchConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.rrf.validate()?;
        if self.leg_timeout.is_zero() {
            return Err("leg_timeout must be > 0".to_string());
        }
        Ok(())
    }
}

/// Dense + sparse retrieval fused with RRF.
///
/// Both legs run concurrently and fail independently. A failed or timed-out
/// leg degrades the result to the surviving side; `search` itself never
/// returns an error.
pub struct HybridSearchService<E, D, S> {
    embedder: E,
    dense: D,
    sparse: S,
    fusion: RrfReranker,
    leg_timeout: Duration,
}

impl<E, D, S> std::fmt::Debug for HybridSearchService<E, D, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridSearchService")
            .field("fusion", &self.fusion)
            .field("leg_timeout", &self.leg_timeout)
            .finish_non_exhaustive()
    }
}

impl<E, D, S> HybridSearchService<E, D, S>
where
    E: EmbeddingProvider,
    D: DenseIndex,
    S: SparseIndex,
{
    pub fn new(embedder: E, dense: D, sparse: S, config: HybridSearchConfig) -> Self {
        Self {
            embedder,
            dense,
            sparse,
            fusion: RrfReranker::new(config.rrf),
            leg_timeout: config.leg_timeout,
        }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn dense_index(&self) -> &D {
        &self.dense
    }

    pub fn sparse_index(&self) -> &S {
        &self.sparse
    }

    pub fn fusion(&self) -> &RrfReranker {
        &self.fusion
    }

    /// Returns up to `limit` fused results; empty when no leg answered.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn search(&self, query: &str, limit: usize) -> Vec<HybridSearchResult> {
        if limit == 0 {
            return Vec::new();
        }

        let fetch = limit.saturating_mul(SEARCH_OVERFETCH_FACTOR);
        let config = self.fusion.config();
        let dense_enabled = config.dense_enabled();
        let sparse_enabled = config.sparse_enabled();

        if !dense_enabled && !sparse_enabled {
            warn!("Both search legs disabled by weight, returning no results");
            return Vec::new();
        }

        let dense_leg = async {
            if !dense_enabled {
                debug!("Dense leg disabled");
                return None;
            }
            match self.dense_leg(query, fetch).await {
                Ok(hits) => Some(hits),
                Err(e) => {
                    warn!(error = %e, "Dense leg failed, degrading to sparse");
                    None
                }
            }
        };
        let sparse_leg = async {
            if !sparse_enabled {
                debug!("Sparse leg disabled");
                return None;
            }
            match self.sparse_leg(query, fetch).await {
                Ok(hits) => Some(hits),
                Err(e) => {
                    warn!(error = %e, "Sparse leg failed, degrading to dense");
                    None
                }
            }
        };

        let (dense, sparse) = tokio::join!(dense_leg, sparse_leg);

        if dense.is_none() && sparse.is_none() {
            error!(limit, "All search legs failed, returning no results");
            return Vec::new();
        }

        let results = self
            .fusion
            .rerank(query, dense.as_deref(), sparse.as_deref(), limit);

        info!(
            dense = dense.as_ref().map(Vec::len),
            sparse = sparse.as_ref().map(Vec::len),
            returned = results.len(),
            method = results.first().map(|r| r.search_method.as_str()),
            "Hybrid search complete"
        );

        results
    }

    /// Two-stage retrieval: fused pool of `rerank_top_k`, reordered by `reranker`.
    ///
    /// An empty pool skips the reranker. A reranker error or timeout falls back
    /// to the fused order.
    #[instrument(skip(self, reranker, query), fields(query_len = query.len()))]
    pub async fn search_with_neural_rerank<R: CrossEncoder>(
        &self,
        reranker: &R,
        query: &str,
        limit: usize,
        rerank_top_k: usize,
    ) -> Vec<HybridSearchResult> {
        let mut pool = self.search(query, rerank_top_k).await;
        if pool.is_empty() || limit == 0 {
            debug!(pool = pool.len(), "Skipping neural rerank");
            pool.truncate(limit);
            return pool;
        }

        let texts: Vec<&str> = pool.iter().map(|r| r.content.as_str()).collect();
        let outcome = match time::timeout(self.leg_timeout, reranker.rerank(query, &texts, limit)).await
        {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout {
                leg: SearchLeg::Rerank,
                timeout_ms: self.leg_timeout.as_millis() as u64,
            }),
        };

        let mut scored = match outcome {
            Ok(scored) => scored,
            Err(e) => {
                warn!(error = %e, "Neural rerank failed, keeping fused order");
                pool.truncate(limit);
                return pool;
            }
        };
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let pool_size = pool.len();
        let mut slots: Vec<Option<HybridSearchResult>> = pool.into_iter().map(Some).collect();
        let mut reranked = Vec::with_capacity(limit.min(scored.len()));
        for (idx, score) in scored {
            if reranked.len() == limit {
                break;
            }
            let Some(mut result) = slots.get_mut(idx).and_then(Option::take) else {
                continue;
            };
            result.rerank_score = Some(score);
            reranked.push(result);
        }

        info!(
            pool = pool_size,
            returned = reranked.len(),
            top_score = reranked.first().and_then(|r| r.rerank_score),
            "Neural rerank complete"
        );

        reranked
    }

    async fn dense_leg(&self, query: &str, limit: usize) -> Result<Vec<DenseHit>, SearchError> {
        let leg = async {
            let embedding = self.embedder.embed(query).await?;
            self.dense.search(&embedding, limit).await
        };
        time::timeout(self.leg_timeout, leg)
            .await
            .map_err(|_| SearchError::Timeout {
                leg: SearchLeg::Dense,
                timeout_ms: self.leg_timeout.as_millis() as u64,
            })?
    }

    async fn sparse_leg(&self, query: &str, limit: usize) -> Result<Vec<SparseHit>, SearchError> {
        time::timeout(self.leg_timeout, self.sparse.search(query, limit))
            .await
            .map_err(|_| SearchError::Timeout {
                leg: SearchLeg::Sparse,
                timeout_ms: self.leg_timeout.as_millis() as u64,
            })?
    }
}
