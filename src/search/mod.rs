//! Hybrid (dense + sparse) retrieval with reciprocal rank fusion.

pub mod backend;
pub mod error;
pub mod keywords;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod rrf;
pub mod service;
pub mod types;


pub use backend::{CrossEncoder, DenseIndex, EmbeddingProvider, SparseIndex};
pub use error::{SearchError, SearchLeg};
pub use keywords::{Keyword, QueryKeywords, TitleMatches};
#[cfg(any(test, feature = "mock"))]
pub use mock::{
    MOCK_EMBEDDING_DIM, MockCrossEncoder, MockDenseIndex, MockDocument, MockEmbedder,
    MockSparseIndex,
};
pub use rrf::{RrfConfig, RrfReranker};
pub use service::{HybridSearchConfig, HybridSearchService};
pub use types::{DenseHit, HybridSearchResult, SearchMethod, SparseHit};
