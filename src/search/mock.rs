//! In-memory search collaborators for tests and demos.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::Value;

use super::backend::{CrossEncoder, DenseIndex, EmbeddingProvider, SparseIndex};
use super::error::SearchError;
use super::types::{DenseHit, SparseHit};
use crate::cache::cosine_similarity;

pub const MOCK_EMBEDDING_DIM: usize = 64;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "have", "has", "had", "do",
    "does", "did", "will", "would", "could", "should", "may", "might", "must", "shall", "can",
    "to", "of", "in", "for", "on", "with", "at", "by", "from", "as", "into", "when", "where",
    "why", "how", "all", "each", "no", "not", "only", "so", "than", "too", "very", "and", "but",
    "if", "or", "what", "which", "who", "this", "that", "these", "those", "it", "its",
];

fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Shared failure/latency switches for the mocks.
#[derive(Debug, Default)]
struct Faults {
    fail: AtomicBool,
    delay_ms: AtomicUsize,
    calls: AtomicUsize,
    last_limit: AtomicUsize,
}

impl Faults {
    async fn enter(&self, limit: usize) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_limit.store(limit, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        self.fail.load(Ordering::SeqCst)
    }

    fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_limit(&self) -> usize {
        self.last_limit.load(Ordering::SeqCst)
    }
}

/// Deterministic hashed bag-of-words embedder.
///
/// Texts sharing more non-stop-words get higher cosine similarity; identical
/// texts embed identically.
#[derive(Debug)]
pub struct MockEmbedder {
    dim: usize,
    faults: Faults,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(MOCK_EMBEDDING_DIM)
    }
}

impl MockEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim: dim.max(1),
            faults: Faults::default(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        for token in tokens(text) {
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let bucket = u64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]) as usize
                % self.dim;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }

    pub fn set_failing(&self, fail: bool) {
        self.faults.set_failing(fail);
    }

    pub fn calls(&self) -> usize {
        self.faults.calls()
    }
}

impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SearchError> {
        if self.faults.enter(0).await {
            return Err(SearchError::Embedding("mock embedder failure".to_string()));
        }
        Ok(self.embed_sync(text))
    }
}

/// A document shared by the dense and sparse mocks.
#[derive(Debug, Clone)]
pub struct MockDocument {
    pub node_id: String,
    pub title: String,
    pub content: String,
    pub source: String,
    pub category: String,
}

impl MockDocument {
    pub fn new(
        node_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            title: title.into(),
            content: content.into(),
            source: "mock".to_string(),
            category: String::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

#[derive(Debug)]
enum DenseData {
    Documents(Vec<(MockDocument, Vec<f32>)>),
    Fixed(Vec<DenseHit>),
}

/// Dense index over pre-embedded documents, or a fixed hit list.
#[derive(Debug)]
pub struct MockDenseIndex {
    data: DenseData,
    faults: Faults,
}

impl MockDenseIndex {
    /// Embeds `documents` (title + content) with `embedder`.
    pub fn from_documents(embedder: &MockEmbedder, documents: &[MockDocument]) -> Self {
        let embedded = documents
            .iter()
            .map(|doc| {
                let text = format!("{} {}", doc.title, doc.content);
                (doc.clone(), embedder.embed_sync(&text))
            })
            .collect();
        Self {
            data: DenseData::Documents(embedded),
            faults: Faults::default(),
        }
    }

    /// Always answers with `hits`, truncated to the requested limit.
    pub fn with_hits(hits: Vec<DenseHit>) -> Self {
        Self {
            data: DenseData::Fixed(hits),
            faults: Faults::default(),
        }
    }

    pub fn failing(self) -> Self {
        self.faults.set_failing(true);
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.faults.set_delay(delay);
        self
    }

    pub fn set_failing(&self, fail: bool) {
        self.faults.set_failing(fail);
    }

    pub fn calls(&self) -> usize {
        self.faults.calls()
    }

    /// `limit` of the most recent search.
    pub fn last_limit(&self) -> usize {
        self.faults.last_limit()
    }
}

impl DenseIndex for MockDenseIndex {
    async fn search(&self, embedding: &[f32], limit: usize) -> Result<Vec<DenseHit>, SearchError> {
        if self.faults.enter(limit).await {
            return Err(SearchError::DenseIndex("mock dense index failure".to_string()));
        }

        let mut hits = match &self.data {
            DenseData::Fixed(hits) => hits.clone(),
            DenseData::Documents(documents) => {
                let mut hits: Vec<DenseHit> = documents
                    .iter()
                    .map(|(doc, vector)| {
                        let similarity = cosine_similarity(embedding, vector).max(0.0);
                        DenseHit::new(doc.node_id.clone(), similarity, doc.content.clone())
                            .with_metadata("title", doc.title.clone())
                            .with_metadata("source", doc.source.clone())
                            .with_metadata("category", doc.category.clone())
                    })
                    .filter(|hit| hit.similarity > 0.0)
                    .collect();
                hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
                hits
            }
        };
        hits.truncate(limit);
        Ok(hits)
    }
}

#[derive(Debug)]
enum SparseData {
    Documents(Vec<MockDocument>),
    Fixed(Vec<SparseHit>),
}

/// Term-frequency sparse index; title terms weigh more than content terms.
#[derive(Debug)]
pub struct MockSparseIndex {
    data: SparseData,
    faults: Faults,
}

impl MockSparseIndex {
    pub const TITLE_TERM_WEIGHT: f32 = 5.0;
    pub const CONTENT_TERM_WEIGHT: f32 = 1.0;

    pub fn from_documents(documents: &[MockDocument]) -> Self {
        Self {
            data: SparseData::Documents(documents.to_vec()),
            faults: Faults::default(),
        }
    }

    pub fn with_hits(hits: Vec<SparseHit>) -> Self {
        Self {
            data: SparseData::Fixed(hits),
            faults: Faults::default(),
        }
    }

    pub fn failing(self) -> Self {
        self.faults.set_failing(true);
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.faults.set_delay(delay);
        self
    }

    pub fn set_failing(&self, fail: bool) {
        self.faults.set_failing(fail);
    }

    pub fn calls(&self) -> usize {
        self.faults.calls()
    }

    pub fn last_limit(&self) -> usize {
        self.faults.last_limit()
    }

    fn score(query_terms: &HashSet<String>, doc: &MockDocument) -> f32 {
        let title_hits = tokens(&doc.title)
            .iter()
            .filter(|t| query_terms.contains(*t))
            .count();
        let content_hits = tokens(&doc.content)
            .iter()
            .filter(|t| query_terms.contains(*t))
            .count();
        title_hits as f32 * Self::TITLE_TERM_WEIGHT
            + content_hits as f32 * Self::CONTENT_TERM_WEIGHT
    }
}

impl SparseIndex for MockSparseIndex {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SparseHit>, SearchError> {
        if self.faults.enter(limit).await {
            return Err(SearchError::SparseIndex("mock sparse index failure".to_string()));
        }

        let mut hits = match &self.data {
            SparseData::Fixed(hits) => hits.clone(),
            SparseData::Documents(documents) => {
                let query_terms: HashSet<String> = tokens(query).into_iter().collect();
                let mut hits: Vec<SparseHit> = documents
                    .iter()
                    .filter_map(|doc| {
                        let score = Self::score(&query_terms, doc);
                        (score > 0.0).then(|| {
                            SparseHit::new(
                                doc.node_id.clone(),
                                score,
                                doc.title.clone(),
                                doc.content.clone(),
                            )
                            .with_source(doc.source.clone())
                            .with_category(doc.category.clone())
                            .with_metadata("matched_terms", Value::from(query_terms.len()))
                        })
                    })
                    .collect();
                hits.sort_by(|a, b| b.score.total_cmp(&a.score));
                hits
            }
        };
        hits.truncate(limit);
        Ok(hits)
    }
}

/// Lexical-overlap cross-encoder stand-in.
#[derive(Debug, Default)]
pub struct MockCrossEncoder {
    faults: Faults,
}

impl MockCrossEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(self) -> Self {
        self.faults.set_failing(true);
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.faults.set_delay(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.faults.calls()
    }

    /// Recall/Jaccard blend over non-stop-words, squashed through a sigmoid.
    pub fn score(query: &str, candidate: &str) -> f32 {
        let query_words: HashSet<String> = tokens(query).into_iter().collect();
        let candidate_words: HashSet<String> = tokens(candidate).into_iter().collect();

        if query_words.is_empty() {
            return 0.0;
        }

        let matches = query_words.intersection(&candidate_words).count();
        let recall = matches as f32 / query_words.len() as f32;
        let union = query_words.union(&candidate_words).count();
        let jaccard = if union > 0 {
            matches as f32 / union as f32
        } else {
            0.0
        };

        let base = 0.6 * recall + 0.4 * jaccard;
        (1.0 / (1.0 + (-8.0 * (base - 0.5)).exp())).clamp(0.0, 1.0)
    }
}

impl CrossEncoder for MockCrossEncoder {
    async fn rerank(
        &self,
        query: &str,
        candidates: &[&str],
        top_k: usize,
    ) -> Result<Vec<(usize, f32)>, SearchError> {
        if self.faults.enter(top_k).await {
            return Err(SearchError::Reranker("mock cross-encoder failure".to_string()));
        }

        let mut scored: Vec<(usize, f32)> = candidates
            .iter()
            .enumerate()
            .map(|(idx, candidate)| (idx, Self::score(query, candidate)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);
        Ok(scored)
    }
}
