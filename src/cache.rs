//! TTL-bound response cache for aggregate search results.
//!
//! Consulted before any network work and populated only on success. The
//! capacity bound evicts by insertion order (oldest entry first) rather
//! than LRU: hit recency is not tracked, and for a 5-minute TTL the
//! difference rarely matters.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use crate::models::AggregateResult;

struct CacheEntry {
    value: AggregateResult,
    expires_at: Instant,
}

struct CacheInner {
    map: HashMap<String, CacheEntry>,
    /// Keys in insertion order; front is the oldest and evicts first.
    order: VecDeque<String>,
}

/// Process-wide cache of aggregate search results, keyed by normalized query.
pub struct ResponseCache {
    inner: Mutex<CacheInner>,
    ttl: Duration,
    capacity: usize,
}

impl ResponseCache {
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                map: HashMap::with_capacity(capacity.min(64)),
                order: VecDeque::with_capacity(capacity.min(64)),
            }),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Look up a cached aggregate. Expired entries are dropped on the spot.
    pub async fn get(&self, key: &str) -> Option<AggregateResult> {
        let mut inner = self.inner.lock().await;
        let expired = match inner.map.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            inner.map.remove(key);
            inner.order.retain(|k| k != key);
            debug!(key, "cache entry expired");
        }
        None
    }

    /// Store an aggregate result.
    ///
    /// Empty results are never cached: an all-retailers-failed aggregate
    /// must not suppress retries for the TTL window.
    pub async fn set(&self, key: &str, value: AggregateResult) {
        if value.products.is_empty() {
            debug!(key, "skipping cache write for empty aggregate");
            return;
        }

        let mut inner = self.inner.lock().await;

        // Re-inserting a live key refreshes value and TTL but keeps its
        // original eviction position.
        if inner.map.contains_key(key) {
            inner.map.insert(
                key.to_string(),
                CacheEntry {
                    value,
                    expires_at: Instant::now() + self.ttl,
                },
            );
            return;
        }

        // Drop expired entries first so they don't occupy capacity.
        let now = Instant::now();
        let stale_keys: Vec<String> = inner
            .order
            .iter()
            .filter(|k| inner.map.get(*k).is_some_and(|e| e.expires_at <= now))
            .cloned()
            .collect();
        for stale in stale_keys {
            inner.map.remove(&stale);
            inner.order.retain(|k| *k != stale);
        }

        while inner.map.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.map.remove(&oldest);
                    debug!(key = %oldest, "evicted oldest cache entry");
                }
                None => break,
            }
        }

        inner.order.push_back(key.to_string());
        inner.map.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Number of live entries (expired entries may still be counted until
    /// the next get/set touches them).
    pub async fn len(&self) -> usize {
        self.inner.lock().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop everything. Used by tests and explicit cache resets.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.map.clear();
        inner.order.clear();
    }
}
