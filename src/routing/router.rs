use tracing::debug;

use super::config::RouterConfig;
use super::types::{CacheSignal, ExecutionPath, QueryComplexity, RoutingDecision};
use crate::cache::CacheLookupResult;
use crate::constants::{
    CACHED_FAST_LATENCY_MS, CACHED_STANDARD_LATENCY_MS, FULL_LATENCY_MS, STANDARD_LATENCY_MS,
};

/// Picks an [`ExecutionPath`] from a cache lookup and/or a grading score.
///
/// Stateless; one instance can be shared by every request.
#[derive(Debug, Clone, Default)]
pub struct AdaptivePipelineRouter {
    config: RouterConfig,
}

impl AdaptivePipelineRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Routes a request.
    ///
    /// `cache` is the outcome of the cache lookup, if one ran. `grading_score`
    /// is the downstream grader's 0-10 score, if one exists yet.
    pub fn route(
        &self,
        cache: Option<CacheSignal>,
        grading_score: Option<f32>,
        complexity: QueryComplexity,
    ) -> RoutingDecision {
        let decision = match cache {
            Some(signal) if signal.hit => self.route_hit(signal.similarity, complexity),
            _ => self.route_miss(grading_score, complexity),
        };

        debug!(
            path = %decision.path,
            complexity = %complexity,
            estimated_latency_ms = decision.estimated_latency_ms,
            reason = %decision.reason,
            "Routed request"
        );
        decision
    }

    pub fn route_lookup<V>(
        &self,
        lookup: &CacheLookupResult<V>,
        grading_score: Option<f32>,
        complexity: QueryComplexity,
    ) -> RoutingDecision {
        self.route(Some(CacheSignal::from(lookup)), grading_score, complexity)
    }

    fn route_hit(&self, similarity: f32, complexity: QueryComplexity) -> RoutingDecision {
        let config = &self.config;
        if !config.enabled {
            return decision(
                ExecutionPath::Full,
                "routing disabled".to_string(),
                complexity,
            );
        }

        if similarity >= config.cached_fast_threshold {
            let mut d = decision(
                ExecutionPath::CachedFast,
                format!(
                    "cache hit, similarity {similarity:.4} >= {:.2}",
                    config.cached_fast_threshold
                ),
                complexity,
            );
            d.skip_grader = true;
            d.skip_verifier = true;
            d
        } else if similarity >= config.cached_standard_threshold {
            let mut d = decision(
                ExecutionPath::CachedStandard,
                format!(
                    "cache hit, similarity {similarity:.4} >= {:.2}",
                    config.cached_standard_threshold
                ),
                complexity,
            );
            d.skip_grader = true;
            d
        } else {
            // Unreachable while the cache threshold is at least cached_standard_threshold.
            decision(
                ExecutionPath::Full,
                format!("cache hit below routing thresholds, similarity {similarity:.4}"),
                complexity,
            )
        }
    }

    fn route_miss(&self, grading_score: Option<f32>, complexity: QueryComplexity) -> RoutingDecision {
        let config = &self.config;
        if !config.enabled {
            return decision(
                ExecutionPath::Full,
                "routing disabled".to_string(),
                complexity,
            );
        }

        let Some(score) = grading_score else {
            return decision(
                ExecutionPath::Full,
                "cache miss, no grading score".to_string(),
                complexity,
            );
        };

        if score >= config.fast_path_grading && complexity == QueryComplexity::Simple {
            let mut d = decision(
                ExecutionPath::Standard,
                format!(
                    "grading {score:.1} >= {:.1} on a simple query",
                    config.fast_path_grading
                ),
                complexity,
            );
            d.skip_verifier = true;
            d
        } else if score >= config.standard_path_grading {
            decision(
                ExecutionPath::Standard,
                format!("grading {score:.1} >= {:.1}", config.standard_path_grading),
                complexity,
            )
        } else {
            decision(
                ExecutionPath::Full,
                format!("grading {score:.1} below {:.1}", config.standard_path_grading),
                complexity,
            )
        }
    }

    /// Nominal latency of `path` for a query of `complexity`.
    pub fn estimate_latency_ms(path: ExecutionPath, complexity: QueryComplexity) -> u64 {
        estimate_latency_ms(path, complexity)
    }
}

fn estimate_latency_ms(path: ExecutionPath, complexity: QueryComplexity) -> u64 {
    match path {
        ExecutionPath::CachedFast => CACHED_FAST_LATENCY_MS,
        ExecutionPath::CachedStandard => CACHED_STANDARD_LATENCY_MS,
        ExecutionPath::Standard => {
            (STANDARD_LATENCY_MS as f64 * complexity.latency_multiplier()).round() as u64
        }
        ExecutionPath::Full => {
            (FULL_LATENCY_MS as f64 * complexity.latency_multiplier()).round() as u64
        }
    }
}

fn decision(path: ExecutionPath, reason: String, complexity: QueryComplexity) -> RoutingDecision {
    RoutingDecision {
        path,
        reason,
        skip_grader: false,
        skip_verifier: false,
        estimated_latency_ms: estimate_latency_ms(path, complexity),
    }
}
