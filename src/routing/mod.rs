//! Per-request execution path selection.

pub mod config;
pub mod router;
pub mod types;


pub use config::RouterConfig;
pub use router::AdaptivePipelineRouter;
pub use types::{CacheSignal, ExecutionPath, QueryComplexity, RoutingDecision};
