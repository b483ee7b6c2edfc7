//! Cross-cutting, shared constants.
//!
//! Component configs default to these values; [`crate::Config::from_env`] can
//! override most of them at startup.

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.95;

pub const DEFAULT_RESPONSE_TTL_SECS: u64 = 7200;
pub const DEFAULT_RETRIEVAL_TTL_SECS: u64 = 1800;
pub const DEFAULT_EMBEDDING_TTL_SECS: u64 = 3600;

pub const DEFAULT_RESPONSE_MAX_ENTRIES: usize = 1000;
pub const DEFAULT_RETRIEVAL_MAX_ENTRIES: usize = 500;
pub const DEFAULT_EMBEDDING_MAX_ENTRIES: usize = 5000;

/// Smoothing factor for the similarity-on-hit moving average.
pub const SIMILARITY_EMA_ALPHA: f32 = 0.1;

/// Number of hex characters kept from the SHA-256 content digest.
pub const CONTENT_HASH_HEX_LEN: usize = 16;

pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_RECOVERY_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_RRF_K: f32 = 60.0;
pub const DEFAULT_DENSE_WEIGHT: f32 = 1.0;
pub const DEFAULT_SPARSE_WEIGHT: f32 = 1.0;
pub const DEFAULT_SPARSE_PRIORITY_THRESHOLD: f32 = 15.0;
pub const DEFAULT_SPARSE_PRIORITY_BOOST: f32 = 1.5;
/// Divides raw sparse scores into a range comparable with cosine similarity.
pub const DEFAULT_SPARSE_SCORE_NORMALIZER: f32 = 20.0;

/// Each search leg over-fetches by this factor before fusion.
pub const SEARCH_OVERFETCH_FACTOR: usize = 2;
pub const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 5_000;

pub const DEFAULT_CACHED_FAST_THRESHOLD: f32 = 0.99;
pub const DEFAULT_CACHED_STANDARD_THRESHOLD: f32 = 0.95;
pub const DEFAULT_FAST_PATH_GRADING: f32 = 9.0;
pub const DEFAULT_STANDARD_PATH_GRADING: f32 = 7.0;

/// Nominal per-path latencies (ms) reported with routing decisions.
pub const CACHED_FAST_LATENCY_MS: u64 = 50;
pub const CACHED_STANDARD_LATENCY_MS: u64 = 400;
pub const STANDARD_LATENCY_MS: u64 = 2_500;
pub const FULL_LATENCY_MS: u64 = 6_000;
