//! Corpus and component builders.

use std::time::Duration;

use hermes::{
    CacheConfig, CacheManager, CircuitBreakerConfig, DenseHit, HybridSearchConfig,
    HybridSearchService, MockDenseIndex, MockDocument, MockEmbedder, MockSparseIndex, SparseHit,
};

pub type MockSearch = HybridSearchService<MockEmbedder, MockDenseIndex, MockSparseIndex>;

pub const RULE_15_QUERY: &str = "Rule 15 crossing situation";

/// Cached answer payload used across tests.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}

impl Answer {
    pub fn new(text: &str, sources: &[&str]) -> Self {
        Self {
            text: text.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub fn colregs_corpus() -> Vec<MockDocument> {
    vec![
        MockDocument::new(
            "colregs-rule-15",
            "Rule 15 - Crossing Situation",
            "When two power-driven vessels are crossing so as to involve risk of collision, \
             the vessel which has the other on her own starboard side shall keep out of the way \
             and shall, if the circumstances of the case admit, avoid crossing ahead of the other vessel.",
        )
        .with_category("steering"),
        MockDocument::new(
            "colregs-rule-13",
            "Rule 13 - Overtaking",
            "Any vessel overtaking any other shall keep out of the way of the vessel being overtaken.",
        )
        .with_category("steering"),
        MockDocument::new(
            "colregs-rule-14",
            "Rule 14 - Head-on Situation",
            "When two power-driven vessels are meeting on reciprocal or nearly reciprocal courses \
             so as to involve risk of collision each shall alter her course to starboard.",
        )
        .with_category("steering"),
        MockDocument::new(
            "colregs-rule-16",
            "Rule 16 - Action by Give-way Vessel",
            "Every vessel which is directed to keep out of the way of another vessel shall, \
             so far as possible, take early and substantial action to keep well clear.",
        )
        .with_category("steering"),
        MockDocument::new(
            "colregs-rule-19",
            "Rule 19 - Conduct of Vessels in Restricted Visibility",
            "Every vessel shall proceed at a safe speed adapted to the prevailing circumstances \
             and conditions of restricted visibility.",
        )
        .with_category("visibility"),
        MockDocument::new(
            "colregs-annex-i",
            "Annex I - Positioning and Technical Details of Lights and Shapes",
            "Vertical positioning and spacing of lights on a power-driven vessel.",
        )
        .with_category("annex"),
    ]
}

/// Search service over [`colregs_corpus`].
pub fn corpus_search() -> MockSearch {
    corpus_search_with(HybridSearchConfig::default())
}

pub fn corpus_search_with(config: HybridSearchConfig) -> MockSearch {
    let corpus = colregs_corpus();
    let embedder = MockEmbedder::default();
    let dense = MockDenseIndex::from_documents(&embedder, &corpus);
    let sparse = MockSparseIndex::from_documents(&corpus);
    HybridSearchService::new(embedder, dense, sparse, config)
}

/// Search service answering with fixed hit lists.
pub fn fixed_search(dense: Vec<DenseHit>, sparse: Vec<SparseHit>) -> MockSearch {
    HybridSearchService::new(
        MockEmbedder::default(),
        MockDenseIndex::with_hits(dense),
        MockSparseIndex::with_hits(sparse),
        HybridSearchConfig::default(),
    )
}

pub fn cache_manager() -> CacheManager<Answer> {
    CacheManager::new(CacheConfig::default(), CircuitBreakerConfig::default())
        .expect("default cache config is valid")
}

pub fn cache_manager_with(config: CacheConfig, recovery: Duration) -> CacheManager<Answer> {
    CacheManager::new(config, CircuitBreakerConfig::new(5, recovery))
        .expect("cache config is valid")
}

/// Deterministic query embedding.
pub fn embed(text: &str) -> Vec<f32> {
    MockEmbedder::default().embed_sync(text)
}

/// Unit vector along `axis` in `dim` dimensions.
pub fn unit(dim: usize, axis: usize) -> Vec<f32> {
    let mut v = vec![0.0; dim];
    v[axis % dim] = 1.0;
    v
}
