//! Per-host in-flight limiter.
//!
//! HTTP strategies trial proxies sequentially, and two cascades hitting
//! the same retailer host in parallel would defeat that pacing. Each host
//! gets a one-permit semaphore; holding the permit spans a single
//! request/response exchange.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// One-permit-per-host limiter backed by a lock-free map.
pub struct HostLimiter {
    semaphores: DashMap<String, Arc<Semaphore>>,
    permits_per_host: usize,
}

impl HostLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_permits(1)
    }

    #[must_use]
    pub fn with_permits(permits_per_host: usize) -> Self {
        Self {
            semaphores: DashMap::new(),
            permits_per_host: permits_per_host.max(1),
        }
    }

    /// Acquire the host's permit, creating the semaphore on first use.
    /// The permit releases on drop.
    pub async fn acquire(&self, host: String) -> OwnedSemaphorePermit {
        let semaphore = self
            .semaphores
            .entry(host.clone())
            .or_insert_with(|| Arc::new(Semaphore::new(self.permits_per_host)))
            .clone();

        loop {
            if let Ok(permit) = semaphore.clone().acquire_owned().await {
                return permit;
            }
            // Closed semaphores never happen in normal operation; replace
            // and retry rather than propagate an impossible error.
            log::error!("semaphore for host '{host}' was closed unexpectedly - replacing");
            let fresh = Arc::new(Semaphore::new(self.permits_per_host));
            self.semaphores.insert(host.clone(), fresh.clone());
            if let Ok(permit) = fresh.acquire_owned().await {
                return permit;
            }
        }
    }

    #[must_use]
    pub fn tracked_hosts(&self) -> usize {
        self.semaphores.len()
    }
}

impl Default for HostLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_acquire_waits_for_release() {
        let limiter = Arc::new(HostLimiter::new());
        let permit = limiter.acquire("api.croma.com".to_string()).await;

        let limiter2 = Arc::clone(&limiter);
        let pending = tokio::spawn(async move {
            limiter2.acquire("api.croma.com".to_string()).await
        });

        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        assert!(!pending.is_finished());

        drop(permit);
        let _ = tokio::time::timeout(std::time::Duration::from_secs(1), pending)
            .await
            .expect("pending acquire should complete after release")
            .expect("task should not panic");
    }

    #[tokio::test]
    async fn hosts_are_independent() {
        let limiter = HostLimiter::new();
        let _a = limiter.acquire("amazon.in".to_string()).await;
        // Different host must not block.
        let _b = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            limiter.acquire("flipkart.com".to_string()),
        )
        .await
        .expect("different host should acquire immediately");
        assert_eq!(limiter.tracked_hosts(), 2);
    }
}
