//! Document-driven cache invalidation.
//!
//! Each cache tier registers an [`InvalidationHandler`]. When a document changes
//! or is deleted, [`CacheInvalidationManager`] fans the document id out to every
//! tier so entries derived from it are dropped.

pub mod error;
pub mod handler;
pub mod manager;
pub mod types;


pub use error::{InvalidationError, InvalidationResult};
pub use handler::{FnHandler, InvalidationHandler};
pub use manager::CacheInvalidationManager;
pub use types::{DocumentVersion, InvalidationHealth, InvalidationReport, TierInvalidation};
