use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which search legs contributed to a result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    Hybrid,
    DenseOnly,
    SparseOnly,
}

impl SearchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMethod::Hybrid => "hybrid",
            SearchMethod::DenseOnly => "dense_only",
            SearchMethod::SparseOnly => "sparse_only",
        }
    }
}

impl std::fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One hit from the dense (vector) index, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseHit {
    pub node_id: String,
    /// Cosine similarity in `[0, 1]`.
    pub similarity: f32,
    pub content: String,
    /// Chunk metadata. `title`, `source` and `category` are read from here
    /// when the sparse side does not supply them.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl DenseHit {
    pub fn new(node_id: impl Into<String>, similarity: f32, content: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            similarity,
            content: content.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn title(&self) -> &str {
        self.metadata_str("title").unwrap_or_default()
    }

    pub fn source(&self) -> &str {
        self.metadata_str("source").unwrap_or_default()
    }

    pub fn category(&self) -> &str {
        self.metadata_str("category").unwrap_or_default()
    }
}

/// One hit from the sparse (full-text) index, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseHit {
    pub node_id: String,
    /// Raw relevance score; unbounded.
    pub score: f32,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SparseHit {
    pub fn new(
        node_id: impl Into<String>,
        score: f32,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            score,
            title: title.into(),
            content: content.into(),
            source: String::new(),
            category: String::new(),
            metadata: Map::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A fused search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridSearchResult {
    pub node_id: String,
    pub title: String,
    pub content: String,
    pub source: String,
    pub category: String,
    pub dense_score: Option<f32>,
    pub sparse_score: Option<f32>,
    /// 1-indexed.
    pub dense_rank: Option<usize>,
    /// 1-indexed.
    pub sparse_rank: Option<usize>,
    /// Final fused score; results are ordered by it.
    pub rrf_score: f32,
    /// Cross-encoder relevance, only set by a second-stage rerank.
    pub rerank_score: Option<f32>,
    pub search_method: SearchMethod,
    pub metadata: Map<String, Value>,
}

impl HybridSearchResult {
    pub(crate) fn from_dense(hit: &DenseHit, rank: usize, method: SearchMethod) -> Self {
        Self {
            node_id: hit.node_id.clone(),
            title: hit.title().to_string(),
            content: hit.content.clone(),
            source: hit.source().to_string(),
            category: hit.category().to_string(),
            dense_score: Some(hit.similarity),
            sparse_score: None,
            dense_rank: Some(rank),
            sparse_rank: None,
            rrf_score: 0.0,
            rerank_score: None,
            search_method: method,
            metadata: hit.metadata.clone(),
        }
    }

    pub(crate) fn from_sparse(hit: &SparseHit, rank: usize, method: SearchMethod) -> Self {
        Self {
            node_id: hit.node_id.clone(),
            title: hit.title.clone(),
            content: hit.content.clone(),
            source: hit.source.clone(),
            category: hit.category.clone(),
            dense_score: None,
            sparse_score: Some(hit.score),
            dense_rank: None,
            sparse_rank: Some(rank),
            rrf_score: 0.0,
            rerank_score: None,
            search_method: method,
            metadata: hit.metadata.clone(),
        }
    }

    /// Folds the sparse side into a result first seen on the dense side.
    ///
    /// Sparse metadata wins on key conflicts; sparse descriptive fields replace
    /// dense ones unless empty.
    pub(crate) fn merge_sparse(&mut self, hit: &SparseHit, rank: usize) {
        self.sparse_score = Some(hit.score);
        self.sparse_rank = Some(rank);

        for (field, value) in [
            (&mut self.title, &hit.title),
            (&mut self.source, &hit.source),
            (&mut self.category, &hit.category),
        ] {
            if !value.is_empty() {
                field.clone_from(value);
            }
        }
        if self.content.is_empty() {
            self.content.clone_from(&hit.content);
        }

        for (key, value) in &hit.metadata {
            self.metadata.insert(key.clone(), value.clone());
        }
    }

    pub fn in_both(&self) -> bool {
        self.dense_rank.is_some() && self.sparse_rank.is_some()
    }
}
