//! Read accessors for `EngineConfig`
//!
//! Fields stay crate-private so mutation only happens through the builder;
//! everything downstream reads through these.

use std::path::PathBuf;
use std::time::Duration;

use super::types::EngineConfig;

impl EngineConfig {
    #[must_use]
    pub fn retailers(&self) -> Option<&[String]> {
        self.retailers.as_deref()
    }

    #[must_use]
    pub fn max_concurrent_retailers(&self) -> usize {
        self.max_concurrent_retailers
    }

    #[must_use]
    pub fn early_exit_threshold(&self) -> usize {
        self.early_exit_threshold
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    #[must_use]
    pub fn http_deadline(&self) -> Duration {
        Duration::from_secs(self.http_deadline_secs)
    }

    #[must_use]
    pub fn browser_deadline(&self) -> Duration {
        Duration::from_secs(self.browser_deadline_secs)
    }

    #[must_use]
    pub fn cascade_attempts(&self) -> u8 {
        self.cascade_attempts
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    #[must_use]
    pub fn proxies(&self) -> &[String] {
        &self.proxies
    }

    #[must_use]
    pub fn max_proxy_attempts(&self) -> usize {
        self.max_proxy_attempts.max(1)
    }

    #[must_use]
    pub fn max_contexts(&self) -> usize {
        self.max_contexts
    }

    #[must_use]
    pub fn context_max_age(&self) -> Duration {
        Duration::from_secs(self.context_max_age_secs)
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn block_resources(&self) -> bool {
        self.block_resources
    }

    #[must_use]
    pub fn action_delay_ms(&self) -> (u64, u64) {
        self.action_delay_ms
    }

    #[must_use]
    pub fn debug_capture(&self) -> bool {
        self.debug_capture
    }

    #[must_use]
    pub fn capture_dir(&self) -> Option<&PathBuf> {
        self.capture_dir.as_ref()
    }

    #[must_use]
    pub fn offload_workers(&self) -> Option<usize> {
        self.offload_workers
    }
}
