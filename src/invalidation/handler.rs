use async_trait::async_trait;

use super::error::InvalidationResult;

/// Capability a cache tier exposes so document changes can evict derived entries.
#[async_trait]
pub trait InvalidationHandler: Send + Sync {
    /// Removes every entry derived from `document_id` and returns how many were removed.
    async fn invalidate_document(&self, document_id: &str) -> InvalidationResult<usize>;
}

/// Adapts a synchronous closure into an [`InvalidationHandler`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&str) -> InvalidationResult<usize> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> InvalidationHandler for FnHandler<F>
where
    F: Fn(&str) -> InvalidationResult<usize> + Send + Sync,
{
    async fn invalidate_document(&self, document_id: &str) -> InvalidationResult<usize> {
        (self.f)(document_id)
    }
}
