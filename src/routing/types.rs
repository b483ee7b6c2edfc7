use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache::CacheLookupResult;

/// How much of the downstream pipeline a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionPath {
    /// Serve the cached answer as-is.
    CachedFast,
    /// Serve the cached answer after verification.
    CachedStandard,
    /// Generate, skipping optional checks.
    Standard,
    /// Generate with every check.
    Full,
}

impl ExecutionPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionPath::CachedFast => "CACHED_FAST",
            ExecutionPath::CachedStandard => "CACHED_STANDARD",
            ExecutionPath::Standard => "STANDARD",
            ExecutionPath::Full => "FULL",
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, ExecutionPath::CachedFast | ExecutionPath::CachedStandard)
    }
}

impl std::fmt::Display for ExecutionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryComplexity {
    Simple,
    #[default]
    Medium,
    Complex,
}

impl QueryComplexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryComplexity::Simple => "simple",
            QueryComplexity::Medium => "medium",
            QueryComplexity::Complex => "complex",
        }
    }

    /// Scales the nominal latency of non-cached paths.
    pub fn latency_multiplier(&self) -> f64 {
        match self {
            QueryComplexity::Simple => 1.0,
            QueryComplexity::Medium => 1.25,
            QueryComplexity::Complex => 1.5,
        }
    }
}

impl std::fmt::Display for QueryComplexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryComplexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(QueryComplexity::Simple),
            "medium" => Ok(QueryComplexity::Medium),
            "complex" => Ok(QueryComplexity::Complex),
            other => Err(format!("unknown query complexity '{other}'")),
        }
    }
}

/// The parts of a cache lookup the router looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheSignal {
    pub hit: bool,
    pub similarity: f32,
}

impl CacheSignal {
    pub fn hit(similarity: f32) -> Self {
        Self {
            hit: true,
            similarity,
        }
    }

    pub fn miss() -> Self {
        Self {
            hit: false,
            similarity: 0.0,
        }
    }
}

impl<V> From<&CacheLookupResult<V>> for CacheSignal {
    fn from(result: &CacheLookupResult<V>) -> Self {
        Self {
            hit: result.hit,
            similarity: result.similarity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    pub path: ExecutionPath,
    pub reason: String,
    pub skip_grader: bool,
    pub skip_verifier: bool,
    /// For dashboards only; never used for routing.
    pub estimated_latency_ms: u64,
}
