//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `HERMES_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{CacheConfig, CircuitBreakerConfig};
use crate::routing::RouterConfig;
use crate::search::HybridSearchConfig;

/// Configuration for every component, loaded from environment variables.
///
/// Use [`Config::from_env`] to read `HERMES_*` overrides on top of defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub cache: CacheConfig,
    pub breaker: CircuitBreakerConfig,
    pub search: HybridSearchConfig,
    pub router: RouterConfig,
}

impl Config {
    const ENV_CACHE_ENABLED: &'static str = "HERMES_CACHE_ENABLED";
    const ENV_CACHE_LOG_OPERATIONS: &'static str = "HERMES_CACHE_LOG_OPERATIONS";
    const ENV_SIMILARITY_THRESHOLD: &'static str = "HERMES_SIMILARITY_THRESHOLD";
    const ENV_RESPONSE_TTL_SECS: &'static str = "HERMES_RESPONSE_TTL_SECS";
    const ENV_RETRIEVAL_TTL_SECS: &'static str = "HERMES_RETRIEVAL_TTL_SECS";
    const ENV_EMBEDDING_TTL_SECS: &'static str = "HERMES_EMBEDDING_TTL_SECS";
    const ENV_RESPONSE_MAX_ENTRIES: &'static str = "HERMES_RESPONSE_MAX_ENTRIES";
    const ENV_RETRIEVAL_MAX_ENTRIES: &'static str = "HERMES_RETRIEVAL_MAX_ENTRIES";
    const ENV_EMBEDDING_MAX_ENTRIES: &'static str = "HERMES_EMBEDDING_MAX_ENTRIES";
    const ENV_RRF_K: &'static str = "HERMES_RRF_K";
    const ENV_DENSE_WEIGHT: &'static str = "HERMES_DENSE_WEIGHT";
    const ENV_SPARSE_WEIGHT: &'static str = "HERMES_SPARSE_WEIGHT";
    const ENV_SEARCH_TIMEOUT_MS: &'static str = "HERMES_SEARCH_TIMEOUT_MS";
    const ENV_ROUTER_ENABLED: &'static str = "HERMES_ROUTER_ENABLED";
    const ENV_CACHED_FAST_THRESHOLD: &'static str = "HERMES_CACHED_FAST_THRESHOLD";
    const ENV_CACHED_STANDARD_THRESHOLD: &'static str = "HERMES_CACHED_STANDARD_THRESHOLD";
    const ENV_FAST_PATH_GRADING: &'static str = "HERMES_FAST_PATH_GRADING";
    const ENV_STANDARD_PATH_GRADING: &'static str = "HERMES_STANDARD_PATH_GRADING";
    const ENV_BREAKER_FAILURE_THRESHOLD: &'static str = "HERMES_BREAKER_FAILURE_THRESHOLD";
    const ENV_BREAKER_RECOVERY_SECS: &'static str = "HERMES_BREAKER_RECOVERY_SECS";

    /// Loads configuration from environment variables (falling back to defaults).
    ///
    /// Unset or empty variables keep their default; malformed values are errors.
    /// Ranges are not checked here, see [`Config::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let cache = CacheConfig {
            enabled: Self::parse_bool_from_env(Self::ENV_CACHE_ENABLED, defaults.cache.enabled)?,
            log_cache_operations: Self::parse_bool_from_env(
                Self::ENV_CACHE_LOG_OPERATIONS,
                defaults.cache.log_cache_operations,
            )?,
            similarity_threshold: Self::parse_from_env(
                Self::ENV_SIMILARITY_THRESHOLD,
                defaults.cache.similarity_threshold,
            )?,
            response_ttl: Self::parse_secs_from_env(
                Self::ENV_RESPONSE_TTL_SECS,
                defaults.cache.response_ttl,
            )?,
            retrieval_ttl: Self::parse_secs_from_env(
                Self::ENV_RETRIEVAL_TTL_SECS,
                defaults.cache.retrieval_ttl,
            )?,
            embedding_ttl: Self::parse_secs_from_env(
                Self::ENV_EMBEDDING_TTL_SECS,
                defaults.cache.embedding_ttl,
            )?,
            response_max_entries: Self::parse_from_env(
                Self::ENV_RESPONSE_MAX_ENTRIES,
                defaults.cache.response_max_entries,
            )?,
            retrieval_max_entries: Self::parse_from_env(
                Self::ENV_RETRIEVAL_MAX_ENTRIES,
                defaults.cache.retrieval_max_entries,
            )?,
            embedding_max_entries: Self::parse_from_env(
                Self::ENV_EMBEDDING_MAX_ENTRIES,
                defaults.cache.embedding_max_entries,
            )?,
            ..defaults.cache
        };

        let breaker = CircuitBreakerConfig {
            failure_threshold: Self::parse_from_env(
                Self::ENV_BREAKER_FAILURE_THRESHOLD,
                defaults.breaker.failure_threshold,
            )?,
            recovery_timeout: Self::parse_secs_from_env(
                Self::ENV_BREAKER_RECOVERY_SECS,
                defaults.breaker.recovery_timeout,
            )?,
        };

        let mut search = defaults.search;
        search.rrf.k = Self::parse_from_env(Self::ENV_RRF_K, search.rrf.k)?;
        search.rrf.dense_weight =
            Self::parse_from_env(Self::ENV_DENSE_WEIGHT, search.rrf.dense_weight)?;
        search.rrf.sparse_weight =
            Self::parse_from_env(Self::ENV_SPARSE_WEIGHT, search.rrf.sparse_weight)?;
        search.leg_timeout = Duration::from_millis(Self::parse_from_env(
            Self::ENV_SEARCH_TIMEOUT_MS,
            search.leg_timeout.as_millis() as u64,
        )?);

        let router = RouterConfig {
            enabled: Self::parse_bool_from_env(Self::ENV_ROUTER_ENABLED, defaults.router.enabled)?,
            cached_fast_threshold: Self::parse_from_env(
                Self::ENV_CACHED_FAST_THRESHOLD,
                defaults.router.cached_fast_threshold,
            )?,
            cached_standard_threshold: Self::parse_from_env(
                Self::ENV_CACHED_STANDARD_THRESHOLD,
                defaults.router.cached_standard_threshold,
            )?,
            fast_path_grading: Self::parse_from_env(
                Self::ENV_FAST_PATH_GRADING,
                defaults.router.fast_path_grading,
            )?,
            standard_path_grading: Self::parse_from_env(
                Self::ENV_STANDARD_PATH_GRADING,
                defaults.router.standard_path_grading,
            )?,
        };

        Ok(Self {
            cache,
            breaker,
            search,
            router,
        })
    }

    /// Checks every section's ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate().map_err(Self::invalid("cache"))?;
        self.breaker.validate().map_err(Self::invalid("breaker"))?;
        self.search.validate().map_err(Self::invalid("search"))?;
        self.router.validate().map_err(Self::invalid("router"))?;
        Ok(())
    }

    fn invalid(section: &'static str) -> impl FnOnce(String) -> ConfigError {
        move |reason| ConfigError::Invalid { section, reason }
    }

    fn read_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match Self::read_env(var_name) {
            Some(value) => value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                name: var_name,
                reason: e.to_string(),
                value,
            }),
            None => Ok(default),
        }
    }

    fn parse_secs_from_env(
        var_name: &'static str,
        default: Duration,
    ) -> Result<Duration, ConfigError> {
        Self::parse_from_env(var_name, default.as_secs()).map(Duration::from_secs)
    }

    fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Some(value) = Self::read_env(var_name) else {
            return Ok(default);
        };
        match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                name: var_name,
                value,
                reason: "expected a boolean (true/false, 1/0, yes/no, on/off)".to_string(),
            }),
        }
    }
}
