//! Builder for `EngineConfig` with defaults, env overrides and validation
//!
//! Every knob starts at the constant defaults from `utils::constants`, can
//! be overridden fluently, and finally by `SHOPSCOUT_*` environment
//! variables so deployments can retune without a rebuild.

use anyhow::{Result, bail};
use std::path::PathBuf;

use super::types::EngineConfig;
use crate::utils::{
    DEFAULT_ACTION_DELAY_MS, DEFAULT_BROWSER_DEADLINE_SECS, DEFAULT_CACHE_CAPACITY,
    DEFAULT_CACHE_TTL_SECS, DEFAULT_CASCADE_ATTEMPTS, DEFAULT_CONTEXT_MAX_AGE_SECS,
    DEFAULT_EARLY_EXIT_THRESHOLD, DEFAULT_HTTP_DEADLINE_SECS, DEFAULT_MAX_CONCURRENT_RETAILERS,
    DEFAULT_MAX_CONTEXTS, DEFAULT_MAX_PROXY_ATTEMPTS, DEFAULT_RETRY_DELAY_MS,
};

pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig {
                retailers: None,
                max_concurrent_retailers: DEFAULT_MAX_CONCURRENT_RETAILERS,
                early_exit_threshold: DEFAULT_EARLY_EXIT_THRESHOLD,
                cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
                cache_capacity: DEFAULT_CACHE_CAPACITY,
                http_deadline_secs: DEFAULT_HTTP_DEADLINE_SECS,
                browser_deadline_secs: DEFAULT_BROWSER_DEADLINE_SECS,
                cascade_attempts: DEFAULT_CASCADE_ATTEMPTS,
                retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
                proxies: Vec::new(),
                max_proxy_attempts: DEFAULT_MAX_PROXY_ATTEMPTS,
                max_contexts: DEFAULT_MAX_CONTEXTS,
                context_max_age_secs: DEFAULT_CONTEXT_MAX_AGE_SECS,
                headless: true,
                block_resources: true,
                action_delay_ms: DEFAULT_ACTION_DELAY_MS,
                debug_capture: false,
                capture_dir: None,
                offload_workers: None,
            },
        }
    }
}

impl EngineConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn retailers<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.retailers = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn max_concurrent_retailers(mut self, n: usize) -> Self {
        self.config.max_concurrent_retailers = n;
        self
    }

    #[must_use]
    pub fn early_exit_threshold(mut self, n: usize) -> Self {
        self.config.early_exit_threshold = n;
        self
    }

    #[must_use]
    pub fn cache_ttl_secs(mut self, secs: u64) -> Self {
        self.config.cache_ttl_secs = secs;
        self
    }

    #[must_use]
    pub fn cache_capacity(mut self, n: usize) -> Self {
        self.config.cache_capacity = n;
        self
    }

    #[must_use]
    pub fn http_deadline_secs(mut self, secs: u64) -> Self {
        self.config.http_deadline_secs = secs;
        self
    }

    #[must_use]
    pub fn browser_deadline_secs(mut self, secs: u64) -> Self {
        self.config.browser_deadline_secs = secs;
        self
    }

    #[must_use]
    pub fn cascade_attempts(mut self, n: u8) -> Self {
        self.config.cascade_attempts = n;
        self
    }

    #[must_use]
    pub fn retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry_delay_ms = ms;
        self
    }

    #[must_use]
    pub fn proxies<I, S>(mut self, proxies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.proxies = proxies.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn max_proxy_attempts(mut self, n: usize) -> Self {
        self.config.max_proxy_attempts = n;
        self
    }

    #[must_use]
    pub fn max_contexts(mut self, n: usize) -> Self {
        self.config.max_contexts = n;
        self
    }

    #[must_use]
    pub fn context_max_age_secs(mut self, secs: u64) -> Self {
        self.config.context_max_age_secs = secs;
        self
    }

    #[must_use]
    pub fn headless(mut self, yes: bool) -> Self {
        self.config.headless = yes;
        self
    }

    #[must_use]
    pub fn block_resources(mut self, yes: bool) -> Self {
        self.config.block_resources = yes;
        self
    }

    #[must_use]
    pub fn action_delay_ms(mut self, lo: u64, hi: u64) -> Self {
        self.config.action_delay_ms = (lo, hi);
        self
    }

    #[must_use]
    pub fn debug_capture(mut self, yes: bool) -> Self {
        self.config.debug_capture = yes;
        self
    }

    #[must_use]
    pub fn capture_dir(mut self, dir: PathBuf) -> Self {
        self.config.capture_dir = Some(dir);
        self
    }

    #[must_use]
    pub fn offload_workers(mut self, n: usize) -> Self {
        self.config.offload_workers = Some(n);
        self
    }

    /// Apply `SHOPSCOUT_*` environment overrides on top of whatever has
    /// been set so far. Unparseable values are ignored, not fatal.
    #[must_use]
    pub fn env_overrides(mut self) -> Self {
        fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
            std::env::var(name).ok().and_then(|v| v.parse().ok())
        }

        if let Some(n) = parse_env::<usize>("SHOPSCOUT_CONCURRENCY") {
            self.config.max_concurrent_retailers = n;
        }
        if let Some(n) = parse_env::<usize>("SHOPSCOUT_EARLY_EXIT") {
            self.config.early_exit_threshold = n;
        }
        if let Some(n) = parse_env::<u64>("SHOPSCOUT_CACHE_TTL_SECS") {
            self.config.cache_ttl_secs = n;
        }
        if let Some(n) = parse_env::<usize>("SHOPSCOUT_CACHE_CAPACITY") {
            self.config.cache_capacity = n;
        }
        if let Some(v) = std::env::var("SHOPSCOUT_PROXIES").ok().filter(|v| !v.is_empty()) {
            self.config.proxies = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Some(v) = std::env::var("SHOPSCOUT_RETAILERS").ok().filter(|v| !v.is_empty()) {
            self.config.retailers = Some(v.split(',').map(|s| s.trim().to_string()).collect());
        }
        if let Some(b) = parse_env::<bool>("SHOPSCOUT_DEBUG_CAPTURE") {
            self.config.debug_capture = b;
        }
        if let Some(b) = parse_env::<bool>("SHOPSCOUT_HEADLESS") {
            self.config.headless = b;
        }
        if let Some(n) = parse_env::<usize>("SHOPSCOUT_MAX_CONTEXTS") {
            self.config.max_contexts = n;
        }
        if let Some(n) = parse_env::<usize>("SHOPSCOUT_OFFLOAD_WORKERS") {
            self.config.offload_workers = (n > 0).then_some(n);
        }
        self
    }

    /// Validate and produce the final config.
    pub fn build(self) -> Result<EngineConfig> {
        let c = &self.config;
        if c.max_concurrent_retailers == 0 {
            bail!("max_concurrent_retailers must be at least 1");
        }
        if c.cascade_attempts == 0 {
            bail!("cascade_attempts must be at least 1");
        }
        if c.max_contexts == 0 {
            bail!("max_contexts must be at least 1");
        }
        if c.cache_capacity == 0 {
            bail!("cache_capacity must be at least 1");
        }
        if c.action_delay_ms.1 < c.action_delay_ms.0 {
            bail!(
                "action_delay_ms range is inverted: {} > {}",
                c.action_delay_ms.0,
                c.action_delay_ms.1
            );
        }
        if let Some(keys) = &c.retailers
            && keys.is_empty()
        {
            bail!("retailers list, when given, must not be empty");
        }
        Ok(self.config)
    }
}
