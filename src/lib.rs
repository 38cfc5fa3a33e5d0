pub mod browser_pool;
pub mod browser_setup;
pub mod cache;
pub mod config;
pub mod debug_capture;
pub mod engine;
pub mod enrich;
pub mod identity;
pub mod models;
pub mod normalize;
pub mod retailers;
pub mod stealth;
pub mod strategies;
pub mod utils;

pub use browser_pool::{ContextLease, ContextPool, PoolError, PoolSettings};
pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use cache::ResponseCache;
pub use config::{EngineConfig, EngineConfigBuilder};
pub use debug_capture::DebugCapture;
pub use engine::{
    CascadeWorkerPool, ExecMode, FailureKind, HostLimiter, RetailerExecutor, SearchEngine,
    SearchError, SearchResult,
};
pub use enrich::{Enricher, NoopEnricher};
pub use identity::{BrowserIdentity, ProxyEndpoint, ProxyKind, ProxyRotator};
pub use models::{
    AggregateResult, Product, RetailerOutcome, SearchQuery, StrategyKind, StrategyResult,
};
pub use retailers::{Retailer, RetailerConfig, RetailerRegistry};
pub use strategies::{AttemptContext, BrowserSniff, DirectApi, GraphQl, Harvested, Strategy};
