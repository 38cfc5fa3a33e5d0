//! Fan-out orchestrator.
//!
//! The top of the engine: checks the cache, fans retailer cascades out
//! under a global concurrency cap, applies the early-exit threshold,
//! aggregates partial results and writes winners back to the cache.
//! Individual retailer failures never fail the search; the only error the
//! caller can see is an empty retailer registry.

use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::offload::CascadeWorkerPool;
use super::types::{SearchError, SearchResult};
use super::{cascade, host_limiter::HostLimiter, retry};
use crate::browser_pool::{ContextPool, PoolSettings};
use crate::cache::ResponseCache;
use crate::config::EngineConfig;
use crate::debug_capture::DebugCapture;
use crate::enrich::Enricher;
use crate::identity::ProxyRotator;
use crate::models::{AggregateResult, RetailerOutcome, SearchQuery};
use crate::retailers::RetailerRegistry;
use crate::strategies::AttemptContext;

/// Which strategy set a cascade invocation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecMode {
    /// HTTP strategies only; the orchestrator's first pass.
    Fast,
    /// Full cascade including the browser strategy.
    Thorough,
}

/// Executes one retailer cascade. The orchestrator only sees this seam,
/// which keeps fan-out semantics testable without network or browsers.
pub type RetailerExecutor = Arc<
    dyn Fn(&'static str, SearchQuery, ExecMode) -> BoxFuture<'static, RetailerOutcome>
        + Send
        + Sync,
>;

/// Running tallies for one search call.
#[derive(Default)]
struct Aggregation {
    products: Vec<crate::models::Product>,
    scraped: Vec<String>,
    failed: Vec<String>,
    seen: std::collections::HashSet<(String, String)>,
}

impl Aggregation {
    fn record(&mut self, outcome: RetailerOutcome) {
        if outcome.succeeded {
            self.scraped.push(outcome.retailer.clone());
            self.failed.retain(|k| *k != outcome.retailer);
            for product in outcome.products {
                // Listings can repeat across a retailer's tiers (sponsored
                // slots, sniffed payload overlapping embedded state).
                if self.seen.insert((product.retailer.clone(), product.id.clone())) {
                    self.products.push(product);
                }
            }
        } else if !self.failed.contains(&outcome.retailer) && !self.scraped.contains(&outcome.retailer) {
            self.failed.push(outcome.retailer);
        }
    }
}

/// The multi-tier product search engine.
pub struct SearchEngine {
    config: Arc<EngineConfig>,
    keys: Vec<&'static str>,
    cache: ResponseCache,
    executor: RetailerExecutor,
    pool: Option<Arc<ContextPool>>,
    offload: Option<Arc<CascadeWorkerPool>>,
}

impl SearchEngine {
    /// Build a fully wired engine: registry, cache, proxy rotator,
    /// browser pool, and (optionally) the worker offload layer.
    pub fn new(config: EngineConfig) -> SearchResult<Self> {
        let registry = match config.retailers() {
            Some(keys) => RetailerRegistry::with_defaults().restricted_to(keys),
            None => RetailerRegistry::with_defaults(),
        };
        let keys = registry.keys().to_vec();

        let cache = ResponseCache::new(config.cache_ttl(), config.cache_capacity());
        let rotator = Arc::new(ProxyRotator::from_strings(config.proxies()));
        // The browser process is long-lived and shared, so it gets one
        // egress from the rotator at launch; per-attempt rotation applies
        // to the HTTP strategies.
        let pool = ContextPool::new(PoolSettings::from(&config), rotator.next());
        let capture = Arc::new(DebugCapture::from_config(&config));
        let hosts = Arc::new(HostLimiter::new());
        let config = Arc::new(config);

        let executor = make_default_executor(
            Arc::clone(&config),
            Arc::new(registry),
            rotator,
            Arc::clone(&pool),
            hosts,
            capture,
        );

        let offload = match config.offload_workers() {
            Some(workers) => Some(
                CascadeWorkerPool::new(workers, executor.clone())
                    .map_err(|e| SearchError::ConfigError(format!("{e:#}")))?,
            ),
            None => None,
        };

        Ok(Self {
            config,
            keys,
            cache,
            executor,
            pool: Some(pool),
            offload,
        })
    }

    /// Engine with an injected executor and key list. Test seam: fan-out,
    /// caching and early-exit behavior run against mock cascades.
    #[must_use]
    pub fn with_executor(
        config: EngineConfig,
        keys: Vec<&'static str>,
        executor: RetailerExecutor,
    ) -> Self {
        let cache = ResponseCache::new(config.cache_ttl(), config.cache_capacity());
        Self {
            config: Arc::new(config),
            keys,
            cache,
            executor,
            pool: None,
            offload: None,
        }
    }

    /// Start background maintenance (pool sweep). Idempotent, optional.
    pub async fn start(&self) {
        if let Some(pool) = &self.pool {
            pool.start().await;
        }
    }

    /// Search all configured retailers for a query.
    ///
    /// Always returns a structured aggregate for per-retailer causes; the
    /// only error case is an empty retailer registry.
    pub async fn search(&self, raw_query: &str) -> SearchResult<AggregateResult> {
        if self.keys.is_empty() {
            return Err(SearchError::NoRetailers);
        }

        let query = SearchQuery::new(raw_query);
        if query.raw().is_empty() {
            return Err(SearchError::ConfigError("query is empty".to_string()));
        }

        let start = Instant::now();

        if let Some(mut hit) = self.cache.get(query.cache_key()).await {
            debug!(query = query.cache_key(), "cache hit");
            hit.cached = true;
            hit.execution_time_ms = start.elapsed().as_millis() as u64;
            return Ok(hit);
        }

        let threshold = self.config.early_exit_threshold();
        let mut aggregation = Aggregation::default();

        // Fast path: HTTP-only cascades for every retailer, drained as
        // they finish, early exit once the threshold is crossed. Slower
        // retailers' in-flight work is abandoned, not failed.
        self.run_unordered(&query, ExecMode::Fast, threshold, &mut aggregation)
            .await;

        // Zero products from the fast path means the cheap tiers are
        // walled off everywhere; fall back to sequential batches with the
        // full (browser-inclusive) cascade.
        if aggregation.products.is_empty() {
            info!(query = query.cache_key(), "fast path empty, entering batched browser path");
            self.run_batched(&query, threshold, &mut aggregation).await;
        }

        let result = AggregateResult {
            success: !aggregation.products.is_empty(),
            products: aggregation.products,
            scraped_retailers: aggregation.scraped,
            failed_retailers: aggregation.failed,
            execution_time_ms: start.elapsed().as_millis() as u64,
            cached: false,
        };

        info!(
            query = query.cache_key(),
            products = result.products.len(),
            scraped = result.scraped_retailers.len(),
            failed = result.failed_retailers.len(),
            elapsed_ms = result.execution_time_ms,
            "search complete"
        );

        self.cache.set(query.cache_key(), result.clone()).await;
        Ok(result)
    }

    /// Fast path: all retailers under the global semaphore, take results
    /// in completion order, stop dispatching at the threshold.
    async fn run_unordered(
        &self,
        query: &SearchQuery,
        mode: ExecMode,
        threshold: usize,
        aggregation: &mut Aggregation,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_retailers()));
        let mut in_flight = FuturesUnordered::new();

        for &key in &self.keys {
            let semaphore = Arc::clone(&semaphore);
            let future = self.dispatch(key, query.clone(), mode);
            in_flight.push(async move {
                let _permit = semaphore.acquire_owned().await;
                future.await
            });
        }

        while let Some(outcome) = in_flight.next().await {
            aggregation.record(outcome);
            if aggregation.products.len() >= threshold {
                debug!(
                    total = aggregation.products.len(),
                    threshold, "early exit: abandoning remaining retailers"
                );
                break;
            }
        }
        // Dropping `in_flight` cancels what hasn't finished; lease guards
        // and permits release on drop. Abandoned retailers are counted in
        // neither scraped nor failed.
    }

    /// Fallback: fixed-size batches executed sequentially, each batch's
    /// retailers in parallel, threshold checked between batches.
    async fn run_batched(
        &self,
        query: &SearchQuery,
        threshold: usize,
        aggregation: &mut Aggregation,
    ) {
        let batch_size = self.config.max_concurrent_retailers();

        for batch in self.keys.chunks(batch_size) {
            let futures: Vec<_> = batch
                .iter()
                .map(|&key| self.dispatch(key, query.clone(), ExecMode::Thorough))
                .collect();

            for outcome in futures::future::join_all(futures).await {
                aggregation.record(outcome);
            }

            if aggregation.products.len() >= threshold {
                debug!(
                    total = aggregation.products.len(),
                    threshold, "early exit after batch"
                );
                break;
            }
        }
    }

    /// Route one cascade through the offload pool when configured, else
    /// run it inline on the caller's runtime.
    fn dispatch(
        &self,
        key: &'static str,
        query: SearchQuery,
        mode: ExecMode,
    ) -> BoxFuture<'static, RetailerOutcome> {
        match &self.offload {
            Some(pool) => {
                let pool = Arc::clone(pool);
                Box::pin(async move { pool.submit(key, query, mode).await })
            }
            None => (self.executor)(key, query, mode),
        }
    }

    /// Post-hoc enrichment hook. The engine functions fully without an
    /// enricher; failures degrade to `None`.
    pub async fn enrich_with(
        &self,
        enricher: &dyn Enricher,
        result: &AggregateResult,
    ) -> Option<String> {
        match enricher.enrich(&result.products, None).await {
            Ok(narrative) if !narrative.is_empty() => Some(narrative),
            Ok(_) => None,
            Err(e) => {
                warn!("enrichment failed: {e:#}");
                None
            }
        }
    }

    /// Direct cache access for diagnostics and tests.
    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Release browsers and workers. The engine is unusable afterwards.
    pub async fn shutdown(&self) {
        if let Some(offload) = &self.offload {
            offload.shutdown();
        }
        if let Some(pool) = &self.pool {
            pool.shutdown().await;
        }
    }
}

/// Wire the real cascade executor over the shared services.
fn make_default_executor(
    config: Arc<EngineConfig>,
    registry: Arc<RetailerRegistry>,
    rotator: Arc<ProxyRotator>,
    pool: Arc<ContextPool>,
    hosts: Arc<HostLimiter>,
    capture: Arc<Option<DebugCapture>>,
) -> RetailerExecutor {
    Arc::new(move |key, query, mode| {
        let config = Arc::clone(&config);
        let registry = Arc::clone(&registry);
        let rotator = Arc::clone(&rotator);
        let pool = Arc::clone(&pool);
        let hosts = Arc::clone(&hosts);
        let capture = Arc::clone(&capture);

        Box::pin(async move {
            let Some(retailer) = registry.get(key) else {
                return RetailerOutcome::failure(
                    key.to_string(),
                    Some(format!("retailer '{key}' not configured")),
                );
            };

            let ctx = AttemptContext {
                retailer,
                query: &query,
                config: &config,
                rotator: &rotator,
                pool: &pool,
                hosts: &hosts,
                capture: capture.as_ref().as_ref(),
            };

            let strategies = match mode {
                ExecMode::Fast => cascade::fast_strategies(),
                ExecMode::Thorough => cascade::default_strategies(),
            };

            retry::run_cascade_with_retries(&ctx, &strategies).await
        })
    })
}
