use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, json};

use super::config::CacheConfig;
use super::error::CacheError;
use super::semantic::SemanticResponseCache;
use super::types::{CacheStats, CacheTier};
use crate::invalidation::InvalidationHandler;

fn cache() -> SemanticResponseCache<String> {
    SemanticResponseCache::new(CacheConfig::default()).expect("valid config")
}

fn cache_with(config: CacheConfig) -> SemanticResponseCache<String> {
    SemanticResponseCache::new(config).expect("valid config")
}

fn unit(dim: usize, hot: usize) -> Vec<f32> {
    let mut v = vec![0.0; dim];
    v[hot] = 1.0;
    v
}

fn store(cache: &SemanticResponseCache<String>, query: &str, embedding: Vec<f32>, docs: &[&str]) {
    let stored = cache
        .set(
            query,
            embedding,
            format!("answer to {query}"),
            docs.iter().copied(),
            Map::new(),
        )
        .expect("set should succeed");
    assert!(stored);
}

#[test]
fn test_new_cache_is_empty() {
    let cache = cache();
    assert!(cache.is_empty());
    assert_eq!(cache.tier(), CacheTier::Response);
    assert_eq!(cache.max_entries(), 1000);
    assert_eq!(cache.stats(), CacheStats::default());
}

#[test]
fn test_invalid_config_rejected() {
    let result =
        SemanticResponseCache::<String>::new(CacheConfig::default().with_similarity_threshold(1.5));
    assert!(matches!(result, Err(CacheError::InvalidConfig { .. })));

    let result = SemanticResponseCache::<String>::new(
        CacheConfig::default().with_max_entries(CacheTier::Response, 0),
    );
    assert!(matches!(result, Err(CacheError::InvalidConfig { .. })));
}

#[test]
fn test_tier_specific_ttl_and_capacity() {
    let cache: SemanticResponseCache<String> =
        SemanticResponseCache::for_tier(CacheTier::Retrieval, CacheConfig::default())
            .expect("valid config");
    assert_eq!(cache.tier(), CacheTier::Retrieval);
    assert_eq!(cache.max_entries(), 500);
}

#[test]
fn test_self_lookup_hits() {
    let cache = cache();
    let embedding = vec![0.2, 0.4, 0.1, 0.8];
    store(&cache, "What does Rule 15 require?", embedding.clone(), &["doc-15"]);

    let result = cache
        .get("What does Rule 15 require?", &embedding)
        .expect("lookup should succeed");

    assert!(result.is_hit());
    assert!((result.similarity - 1.0).abs() < 1e-5);
    assert_eq!(
        result.value().map(String::as_str),
        Some("answer to What does Rule 15 require?")
    );
    let entry = result.entry.expect("entry on hit");
    assert_eq!(entry.access_count, 1);
    assert!(entry.references_document("doc-15"));
}

#[test]
fn test_below_threshold_is_miss() {
    let cache = cache();
    store(&cache, "q1", vec![1.0, 0.0, 0.0], &[]);

    // cos = 0.8 < 0.95
    let result = cache.get("q2", &[0.8, 0.6, 0.0]).expect("lookup");
    assert!(!result.is_hit());
    assert_eq!(result.similarity, 0.0);
    assert!(result.entry.is_none());

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 0);
}

#[test]
fn test_threshold_is_inclusive() {
    let cache = cache_with(CacheConfig::default().with_similarity_threshold(0.8));
    store(&cache, "q1", vec![1.0, 0.0], &[]);

    let result = cache.get("q2", &[0.8, 0.6]).expect("lookup");
    assert!(result.is_hit());
}

#[test]
fn test_returns_highest_similarity_entry() {
    let cache = cache_with(CacheConfig::default().with_similarity_threshold(0.5));
    store(&cache, "far", vec![0.6, 0.8, 0.0], &[]);
    store(&cache, "near", vec![0.95, 0.31, 0.0], &[]);
    store(&cache, "unrelated", vec![0.0, 0.0, 1.0], &[]);

    let result = cache.get("probe", &[1.0, 0.3, 0.0]).expect("lookup");
    assert!(result.is_hit());
    assert_eq!(result.entry.map(|e| e.key), Some("near".to_string()));
}

#[test]
fn test_similarity_tie_prefers_most_recently_used() {
    let cache = cache();
    store(&cache, "first", vec![1.0, 0.0], &[]);
    store(&cache, "second", vec![2.0, 0.0], &[]);

    let result = cache.get("probe", &[1.0, 0.0]).expect("lookup");
    assert_eq!(result.entry.map(|e| e.key), Some("second".to_string()));

    // Rewriting "first" makes it the most recent.
    store(&cache, "first", vec![1.0, 0.0], &[]);
    let result = cache.get("probe", &[1.0, 0.0]).expect("lookup");
    assert_eq!(result.entry.map(|e| e.key), Some("first".to_string()));
}

#[test]
fn test_zero_query_embedding_misses() {
    let cache = cache();
    store(&cache, "zero", vec![0.0, 0.0], &[]);

    let result = cache.get("zero", &[0.0, 0.0]).expect("lookup");
    assert!(!result.is_hit());
}

#[test]
fn test_set_replaces_same_query() {
    let cache = cache();
    cache
        .set("q", vec![1.0, 0.0], "old".to_string(), ["a"], Map::new())
        .expect("set");
    cache
        .set("q", vec![0.0, 1.0], "new".to_string(), ["b"], Map::new())
        .expect("set");

    assert_eq!(cache.len(), 1);
    let result = cache.get("q", &[0.0, 1.0]).expect("lookup");
    assert_eq!(result.value().map(String::as_str), Some("new"));
    assert_eq!(cache.invalidate_by_document("a"), 0);
    assert_eq!(cache.stats().evictions, 0);
}

#[test]
fn test_eviction_bound_and_lru_order() {
    let cache = cache_with(CacheConfig::default().with_max_entries(CacheTier::Response, 3));
    store(&cache, "a", unit(4, 0), &[]);
    store(&cache, "b", unit(4, 1), &[]);
    store(&cache, "c", unit(4, 2), &[]);

    // Touch "a" so "b" becomes least recently used.
    assert!(cache.get("a", &unit(4, 0)).expect("lookup").is_hit());

    store(&cache, "d", unit(4, 3), &[]);

    assert_eq!(cache.len(), 3);
    assert!(cache.contains("a"));
    assert!(!cache.contains("b"));
    assert!(cache.contains("c"));
    assert!(cache.contains("d"));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn test_never_exceeds_max_entries() {
    let max = 5;
    let cache = cache_with(CacheConfig::default().with_max_entries(CacheTier::Response, max));
    for i in 0..=max * 3 {
        let embedding = vec![i as f32 + 1.0, 1.0];
        store(&cache, &format!("query {i}"), embedding, &[]);
        assert!(cache.len() <= max);
    }
    assert_eq!(cache.len(), max);
    assert_eq!(cache.stats().evictions, (max * 2 + 1) as u64);
}

#[test]
fn test_expired_entries_are_dropped_on_lookup() {
    let cache = cache_with(
        CacheConfig::default().with_ttl(CacheTier::Response, Duration::from_millis(30)),
    );
    store(&cache, "q", vec![1.0, 0.0], &[]);
    assert!(cache.get("q", &[1.0, 0.0]).expect("lookup").is_hit());

    std::thread::sleep(Duration::from_millis(60));

    let result = cache.get("q", &[1.0, 0.0]).expect("lookup");
    assert!(!result.is_hit());
    assert!(cache.is_empty());
    assert_eq!(cache.stats().expirations, 1);
}

#[test]
fn test_purge_expired() {
    let cache = cache_with(
        CacheConfig::default().with_ttl(CacheTier::Response, Duration::from_millis(20)),
    );
    store(&cache, "a", vec![1.0, 0.0], &[]);
    store(&cache, "b", vec![0.0, 1.0], &[]);
    std::thread::sleep(Duration::from_millis(40));

    assert_eq!(cache.purge_expired(), 2);
    assert!(cache.is_empty());
}

#[test]
fn test_invalidate_by_document() {
    let cache = cache();
    store(&cache, "q1", unit(3, 0), &["doc-a", "doc-b"]);
    store(&cache, "q2", unit(3, 1), &["doc-b"]);
    store(&cache, "q3", unit(3, 2), &["doc-c"]);

    assert_eq!(cache.invalidate_by_document("doc-b"), 2);
    assert_eq!(cache.invalidate_by_document("doc-b"), 0);
    assert_eq!(cache.len(), 1);
    assert!(cache.contains("q3"));
    assert_eq!(cache.stats().invalidations, 2);
}

#[tokio::test]
async fn test_invalidation_handler_impl() {
    let cache = Arc::new(cache());
    store(&cache, "q1", unit(2, 0), &["doc-x"]);

    let handler: Arc<dyn InvalidationHandler> = cache.clone();
    let removed = handler
        .invalidate_document("doc-x")
        .await
        .expect("handler should succeed");
    assert_eq!(removed, 1);
    assert!(cache.is_empty());
}

#[test]
fn test_clear_returns_count() {
    let cache = cache();
    store(&cache, "q1", unit(2, 0), &[]);
    store(&cache, "q2", unit(2, 1), &[]);
    assert_eq!(cache.clear(), 2);
    assert!(cache.is_empty());
    assert_eq!(cache.clear(), 0);
}

#[test]
fn test_disabled_cache() {
    let cache = cache_with(CacheConfig::disabled());
    let stored = cache
        .set("q", vec![1.0], "v".to_string(), Vec::<String>::new(), Map::new())
        .expect("set");
    assert!(!stored);

    let result = cache.get("q", &[1.0]).expect("lookup");
    assert!(!result.is_hit());
    assert_eq!(cache.stats().misses, 0);
}

#[test]
fn test_invalid_embeddings_are_errors() {
    let cache = cache_with(CacheConfig::default().with_embedding_dim(3));

    assert!(matches!(
        cache.get("q", &[1.0, 0.0]),
        Err(CacheError::DimensionMismatch {
            expected: 3,
            actual: 2
        })
    ));
    assert!(matches!(
        cache.set("q", vec![], "v".to_string(), ["d"], Map::new()),
        Err(CacheError::EmptyEmbedding)
    ));
    assert!(matches!(
        cache.set("q", vec![f32::INFINITY, 0.0, 0.0], "v".to_string(), ["d"], Map::new()),
        Err(CacheError::NonFiniteEmbedding { index: 0 })
    ));
    assert!(cache.is_empty());
}

#[test]
fn test_ema_similarity_seeded_by_first_hit() {
    let cache = cache_with(CacheConfig::default().with_similarity_threshold(0.5));
    store(&cache, "q", vec![1.0, 0.0], &[]);

    cache.get("probe", &[1.0, 0.0]).expect("lookup");
    assert!((cache.stats().avg_similarity - 1.0).abs() < 1e-6);

    // cos([0.6, 0.8], [1, 0]) = 0.6 → 0.1 * 0.6 + 0.9 * 1.0 = 0.96
    cache.get("probe", &[0.6, 0.8]).expect("lookup");
    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert!((stats.avg_similarity - 0.96).abs() < 1e-5);
    assert!((stats.hit_rate() - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_metadata_is_preserved() {
    let cache = cache();
    let mut metadata = Map::new();
    metadata.insert("model".to_string(), json!("gpt-4o"));
    metadata.insert("grading_score".to_string(), json!(8.5));
    cache
        .set("q", vec![1.0, 1.0], "v".to_string(), ["d"], metadata)
        .expect("set");

    let entry = cache
        .get("q", &[1.0, 1.0])
        .expect("lookup")
        .entry
        .expect("hit");
    assert_eq!(entry.metadata.get("model"), Some(&json!("gpt-4o")));
    assert_eq!(entry.tier, CacheTier::Response);
    assert!(!entry.is_expired());
}

#[test]
fn test_concurrent_access_keeps_bound() {
    let cache = Arc::new(cache_with(
        CacheConfig::default().with_max_entries(CacheTier::Response, 16),
    ));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..50 {
                    let embedding = vec![t as f32 + 1.0, i as f32 + 1.0];
                    cache
                        .set(&format!("{t}-{i}"), embedding.clone(), String::new(), ["d"], Map::new())
                        .expect("set");
                    cache.get("probe", &embedding).expect("lookup");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread should not panic");
    }

    assert_eq!(cache.len(), 16);
    let stats = cache.stats();
    assert_eq!(stats.evictions, 8 * 50 - 16);
    assert_eq!(stats.hits + stats.misses, 8 * 50);
}
