//! Walks one question through the latency path with in-memory collaborators.
//!
//! Run with `RUST_LOG=hermes=debug cargo run --example hybrid_pipeline --features mock`.

use std::sync::Arc;
use std::time::Duration;

use hermes::{
    AdaptivePipelineRouter, CacheManager, Config, HybridSearchService, MockCrossEncoder,
    MockDenseIndex, MockDocument, MockEmbedder, MockSparseIndex, QueryComplexity,
};
use serde_json::Map;

fn corpus() -> Vec<MockDocument> {
    vec![
        MockDocument::new(
            "colregs-rule-15",
            "Rule 15 - Crossing Situation",
            "When two power-driven vessels are crossing so as to involve risk of collision, \
             the vessel which has the other on her own starboard side shall keep out of the way.",
        )
        .with_category("steering"),
        MockDocument::new(
            "colregs-rule-13",
            "Rule 13 - Overtaking",
            "Any vessel overtaking any other shall keep out of the way of the vessel being overtaken.",
        )
        .with_category("steering"),
        MockDocument::new(
            "colregs-rule-19",
            "Rule 19 - Conduct of Vessels in Restricted Visibility",
            "Every vessel shall proceed at a safe speed adapted to the prevailing circumstances \
             and conditions of restricted visibility.",
        )
        .with_category("visibility"),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let cache: Arc<CacheManager<String>> =
        Arc::new(CacheManager::new(config.cache.clone(), config.breaker.clone())?);
    let sweeper = cache.start_expiry_sweeper(Duration::from_secs(60));
    let router = AdaptivePipelineRouter::new(config.router.clone());

    let docs = corpus();
    let embedder = MockEmbedder::default();
    let dense = MockDenseIndex::from_documents(&embedder, &docs);
    let sparse = MockSparseIndex::from_documents(&docs);
    let search = HybridSearchService::new(embedder, dense, sparse, config.search.clone());
    let reranker = MockCrossEncoder::new();

    let question = "Rule 15 crossing situation";
    let embedding = search.embedder().embed_sync(question);

    for round in 1..=2 {
        let lookup = cache.get(question, &embedding);
        let decision = router.route_lookup(&lookup, None, QueryComplexity::Medium);
        println!(
            "round {round}: {} ({}, ~{} ms)",
            decision.path, decision.reason, decision.estimated_latency_ms
        );

        if let Some(answer) = lookup.value() {
            println!("  cached answer: {answer}");
            continue;
        }

        let results = search
            .search_with_neural_rerank(&reranker, question, 2, 6)
            .await;
        for r in &results {
            println!(
                "  {:<18} rrf={:.4} rerank={:?} method={}",
                r.node_id, r.rrf_score, r.rerank_score, r.search_method
            );
        }

        let answer = results
            .first()
            .map(|r| format!("See {}: {}", r.title, r.content))
            .unwrap_or_else(|| "No answer found".to_string());
        let sources: Vec<String> = results.iter().map(|r| r.node_id.clone()).collect();
        cache.set(question, embedding.clone(), answer, sources, Map::new());
    }

    let report = cache
        .on_document_updated("colregs-rule-15", "Rule 15, amended text")
        .await;
    println!("rule 15 amended, removed {} cached answer(s)", report.total_removed());

    let lookup = cache.get(question, &embedding);
    let decision = router.route_lookup(&lookup, None, QueryComplexity::Medium);
    println!("after update: {} ({})", decision.path, decision.reason);

    println!("{}", serde_json::to_string_pretty(&cache.get_stats())?);

    sweeper.abort();
    Ok(())
}
