//! Core configuration types for the fetch engine
//!
//! This module contains the main `EngineConfig` struct whose fields define
//! every operational knob of the search engine: concurrency, deadlines,
//! caching, proxies, browser pool sizing and debug capture.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration struct for the multi-tier fetch engine.
///
/// Construct through [`EngineConfigBuilder`](super::EngineConfigBuilder),
/// which applies defaults, environment overrides and validation. Fields are
/// crate-private; read access goes through the getters module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Subset of retailer keys to search. `None` means the full registry.
    pub(crate) retailers: Option<Vec<String>>,

    /// Global cap on concurrently-executing retailer cascades.
    pub(crate) max_concurrent_retailers: usize,

    /// Stop dispatching once the aggregate product count crosses this.
    pub(crate) early_exit_threshold: usize,

    pub(crate) cache_ttl_secs: u64,
    pub(crate) cache_capacity: usize,

    /// Deadline for HTTP-transport strategies (direct API, GraphQL,
    /// harvested endpoints).
    pub(crate) http_deadline_secs: u64,

    /// Deadline for the browser strategy. Navigation plus network-idle
    /// plus scraping needs substantially more headroom than plain HTTP.
    pub(crate) browser_deadline_secs: u64,

    /// Total cascade attempts per retailer (initial + retries).
    pub(crate) cascade_attempts: u8,

    /// Base delay between cascade retries; jitter is added on top.
    pub(crate) retry_delay_ms: u64,

    /// Raw proxy strings (`http://host:port`, `socks5://host:port`).
    pub(crate) proxies: Vec<String>,

    /// Maximum proxies tried sequentially within one HTTP strategy attempt.
    pub(crate) max_proxy_attempts: usize,

    /// Browser-context slots per engine. At the cap, leases reuse
    /// existing contexts round-robin instead of growing the pool.
    pub(crate) max_contexts: usize,

    /// Idle contexts older than this are closed by the cleanup sweep.
    pub(crate) context_max_age_secs: u64,

    pub(crate) headless: bool,

    /// Abort image/font/media/stylesheet and analytics requests inside
    /// browser pages. Cuts load time and detection surface.
    pub(crate) block_resources: bool,

    /// Jittered delay range between browser actions, in milliseconds.
    /// Humanizes timing; part of detection-evasion behavior, not tuning.
    pub(crate) action_delay_ms: (u64, u64),

    /// Persist raw request/response payloads and screenshots per attempt.
    pub(crate) debug_capture: bool,

    /// Where debug capture artifacts land. Defaults to a temp subdir.
    pub(crate) capture_dir: Option<PathBuf>,

    /// Offload cascade execution to a fixed pool of worker threads so a
    /// hung browser page cannot stall the caller's runtime. `None`
    /// disables offloading.
    pub(crate) offload_workers: Option<usize>,
}
