use std::sync::Arc;
use std::time::Duration;

use serde_json::Map;

use super::circuit::{CircuitBreakerConfig, CircuitState};
use super::config::CacheConfig;
use super::manager::CacheManager;
use super::types::CacheTier;
use crate::invalidation::{FnHandler, InvalidationError, InvalidationHandler};

const DIM: usize = 3;

fn manager_with(recovery: Duration) -> CacheManager<String> {
    CacheManager::new(
        CacheConfig::default().with_embedding_dim(DIM),
        CircuitBreakerConfig::new(5, recovery),
    )
    .expect("valid config")
}

fn manager() -> CacheManager<String> {
    manager_with(Duration::from_secs(60))
}

fn bad_embedding() -> Vec<f32> {
    vec![1.0; DIM + 1]
}

#[test]
fn test_set_then_get_hits() {
    let manager = manager();
    assert!(manager.set(
        "Rule 15 crossing situation",
        vec![0.1, 0.9, 0.2],
        "Give way to the vessel on your starboard side.".to_string(),
        ["colregs-rule-15"],
        Map::new(),
    ));

    let result = manager.get("Rule 15 crossing situation", &[0.1, 0.9, 0.2]);
    assert!(result.is_hit());
    assert_eq!(
        result.value().map(String::as_str),
        Some("Give way to the vessel on your starboard side.")
    );
}

#[test]
fn test_default_registration() {
    let manager = manager();
    assert_eq!(
        manager.invalidation().registered_tiers(),
        vec![CacheTier::Response]
    );
}

#[test]
fn test_clean_miss_is_not_a_failure() {
    let manager = manager();
    for _ in 0..10 {
        let result = manager.get("nothing cached", &[1.0, 0.0, 0.0]);
        assert!(!result.is_hit());
    }
    assert_eq!(manager.breaker().state(), CircuitState::Closed);
    assert_eq!(manager.breaker().consecutive_failures(), 0);
    assert_eq!(manager.get_stats().bypassed_requests, 0);
}

#[test]
fn test_errors_surface_as_miss_and_open_circuit() {
    let manager = manager();
    assert!(manager.set("q", vec![1.0, 0.0, 0.0], "v".to_string(), ["d"], Map::new()));

    for _ in 0..5 {
        assert!(!manager.get("q", &bad_embedding()).is_hit());
    }
    assert_eq!(manager.breaker().state(), CircuitState::Open);

    // A valid lookup is now bypassed even though the entry exists.
    assert!(!manager.get("q", &[1.0, 0.0, 0.0]).is_hit());
    assert!(!manager.set("q2", vec![0.0, 1.0, 0.0], "v2".to_string(), ["d"], Map::new()));
    assert!(!manager.response_cache().contains("q2"));

    let stats = manager.get_stats();
    assert_eq!(stats.failed_operations, 5);
    assert_eq!(stats.bypassed_requests, 2);
    assert_eq!(stats.total_requests, 8);
    assert_eq!(stats.circuit.state, CircuitState::Open);
}

#[test]
fn test_failed_write_counts_toward_breaker() {
    let manager = manager();
    for i in 0..5 {
        let stored = manager.set(&format!("q{i}"), bad_embedding(), "v".to_string(), ["d"], Map::new());
        assert!(!stored);
    }
    assert!(manager.breaker().is_open());
}

#[test]
fn test_recovery_after_timeout() {
    let manager = manager_with(Duration::from_millis(30));
    assert!(manager.set("q", vec![1.0, 0.0, 0.0], "v".to_string(), ["d"], Map::new()));
    for _ in 0..5 {
        manager.get("q", &bad_embedding());
    }
    assert!(manager.breaker().is_open());

    std::thread::sleep(Duration::from_millis(60));

    // The trial call succeeds and closes the circuit.
    assert!(manager.get("q", &[1.0, 0.0, 0.0]).is_hit());
    assert_eq!(manager.breaker().state(), CircuitState::Closed);
    assert!(manager.get("q", &[1.0, 0.0, 0.0]).is_hit());
}

#[tokio::test]
async fn test_invalidate_document_removes_entries() {
    let manager = manager();
    manager.set("q1", vec![1.0, 0.0, 0.0], "a1".to_string(), ["doc-d"], Map::new());
    manager.set("q2", vec![0.0, 1.0, 0.0], "a2".to_string(), ["doc-d", "doc-e"], Map::new());
    manager.set("q3", vec![0.0, 0.0, 1.0], "a3".to_string(), ["doc-e"], Map::new());

    let report = manager.invalidate_document("doc-d").await;
    assert_eq!(report.count(CacheTier::Response), Some(2));

    assert!(!manager.get("q1", &[1.0, 0.0, 0.0]).is_hit());
    assert!(!manager.get("q2", &[0.0, 1.0, 0.0]).is_hit());
    assert!(manager.get("q3", &[0.0, 0.0, 1.0]).is_hit());
}

#[tokio::test]
async fn test_document_update_flow() {
    let manager = manager();
    manager.set("q1", vec![1.0, 0.0, 0.0], "a1".to_string(), ["doc-d"], Map::new());

    let first = manager.on_document_updated("doc-d", "v1").await;
    assert_eq!(first.count(CacheTier::Response), Some(1));

    manager.set("q1", vec![1.0, 0.0, 0.0], "a1".to_string(), ["doc-d"], Map::new());
    let repeat = manager.on_document_updated("doc-d", "v1").await;
    assert!(repeat.is_empty());
    assert!(manager.get("q1", &[1.0, 0.0, 0.0]).is_hit());

    let deleted = manager.on_document_deleted("doc-d").await;
    assert_eq!(deleted.count(CacheTier::Response), Some(1));
    assert!(!manager.get("q1", &[1.0, 0.0, 0.0]).is_hit());
}

#[tokio::test]
async fn test_extra_tier_handlers() {
    let manager = manager();
    let retrieval: Arc<dyn InvalidationHandler> = Arc::new(FnHandler::new(|_id: &str| {
        Err(InvalidationError::TierUnavailable {
            reason: "redis offline".to_string(),
        })
    }));
    manager.register_handler(CacheTier::Retrieval, retrieval);
    manager.set("q1", vec![1.0, 0.0, 0.0], "a1".to_string(), ["doc-d"], Map::new());

    let report = manager.on_document_updated("doc-d", "new body").await;
    assert_eq!(report.count(CacheTier::Response), Some(1));
    assert_eq!(report.count(CacheTier::Retrieval), Some(-1));
}

#[test]
fn test_embeddings_refreshed_clears_cache() {
    let manager = manager();
    manager.set("q1", vec![1.0, 0.0, 0.0], "a1".to_string(), ["d"], Map::new());

    assert!(manager.on_embeddings_refreshed("v2"));
    assert!(manager.response_cache().is_empty());

    manager.set("q1", vec![1.0, 0.0, 0.0], "a1".to_string(), ["d"], Map::new());
    assert!(!manager.on_embeddings_refreshed("v2"));
    assert_eq!(manager.response_cache().len(), 1);
}

#[test]
fn test_stats_and_reset() {
    let manager = manager();
    manager.set("q1", vec![1.0, 0.0, 0.0], "a1".to_string(), ["d"], Map::new());
    manager.get("q1", &[1.0, 0.0, 0.0]);
    manager.get("other", &[0.0, 1.0, 0.0]);

    let stats = manager.get_stats();
    assert_eq!(stats.total_requests, 3);
    assert_eq!(stats.response.hits, 1);
    assert_eq!(stats.response.misses, 1);
    assert_eq!(stats.response.total_entries, 1);

    let json = serde_json::to_value(&stats).expect("stats serialize");
    assert_eq!(json["circuit"]["state"], "closed");
    assert_eq!(json["invalidation"]["registered_tiers"][0], "response");

    manager.reset();
    let stats = manager.get_stats();
    assert_eq!(stats.total_requests, 0);
    assert_eq!(stats.response.hits, 0);
    assert_eq!(stats.response.total_entries, 0);
    assert_eq!(manager.invalidation().registered_tiers(), vec![CacheTier::Response]);
}

#[tokio::test]
async fn test_expiry_sweeper_purges_and_stops() {
    let manager = Arc::new(
        CacheManager::<String>::new(
            CacheConfig::default().with_ttl(CacheTier::Response, Duration::from_millis(20)),
            CircuitBreakerConfig::default(),
        )
        .expect("valid config"),
    );
    manager.set("q", vec![1.0, 0.0], "v".to_string(), ["d"], Map::new());

    let handle = manager.start_expiry_sweeper(Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(manager.response_cache().is_empty());
    assert_eq!(manager.get_stats().response.expirations, 1);

    drop(manager);
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("sweeper should stop once the manager is dropped")
        .expect("sweeper should not panic");
}
