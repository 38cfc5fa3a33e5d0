//! Fetch Engine Module
//!
//! The orchestration core: per-retailer strategy cascades, the retry
//! wrapper, the per-host limiter, the worker offload layer, and the
//! top-level fan-out orchestrator.

pub mod cascade;
pub mod host_limiter;
pub mod offload;
pub mod orchestrator;
pub mod retry;
pub mod types;

pub use cascade::{default_strategies, fast_strategies, run_cascade};
pub use host_limiter::HostLimiter;
pub use offload::CascadeWorkerPool;
pub use orchestrator::{ExecMode, RetailerExecutor, SearchEngine};
pub use retry::run_cascade_with_retries;
pub use types::{FailureKind, SearchError, SearchResult};
