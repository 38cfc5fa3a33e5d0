//! Acquisition strategies.
//!
//! Four interchangeable executors per retailer, polymorphic over
//! `{build request, execute, parse}` but differing in transport. The
//! cascade tries them in fixed priority order; each strategy reports
//! products or an error and never panics through the boundary.

pub mod browser_sniff;
pub mod direct_api;
pub mod dom_scrape;
pub mod embedded_json;
pub mod graphql;
pub mod harvested;

pub use browser_sniff::BrowserSniff;
pub use direct_api::DirectApi;
pub use graphql::GraphQl;
pub use harvested::Harvested;

use std::sync::Arc;

use anyhow::{Context as _, Result, anyhow};
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::browser_pool::ContextPool;
use crate::config::EngineConfig;
use crate::debug_capture::DebugCapture;
use crate::engine::host_limiter::HostLimiter;
use crate::identity::{BrowserIdentity, ProxyRotator, build_http_client};
use crate::models::{Product, SearchQuery, StrategyKind};
use crate::retailers::Retailer;
use crate::utils::extract_host;

/// Everything a strategy attempt needs, borrowed from the engine for the
/// duration of one cascade.
pub struct AttemptContext<'a> {
    pub retailer: &'a Retailer,
    pub query: &'a SearchQuery,
    pub config: &'a EngineConfig,
    pub rotator: &'a ProxyRotator,
    pub pool: &'a Arc<ContextPool>,
    pub hosts: &'a HostLimiter,
    pub capture: Option<&'a DebugCapture>,
}

/// One acquisition strategy.
///
/// Object-safe so the cascade can hold a priority-ordered slice and tests
/// can substitute mocks.
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Attempt to fetch products. An empty vec is a valid return and is
    /// treated as failure by the cascade.
    fn fetch<'a>(&'a self, ctx: &'a AttemptContext<'a>) -> BoxFuture<'a, Result<Vec<Product>>>;
}

/// Substitute `{query}` in a URL or body template.
#[must_use]
pub(crate) fn fill_template(template: &str, query: &SearchQuery) -> String {
    template.replace("{query}", &query.encoded())
}

/// Run one HTTP strategy with sequential proxy trial.
///
/// Tries up to `max_proxy_attempts` proxies (a single direct attempt when
/// the pool is empty), one in-flight request at a time, each with a fresh
/// identity. Stops at the first 200 whose body parses to a non-empty
/// product list.
pub(crate) async fn execute_with_proxy_rotation<B, P>(
    ctx: &AttemptContext<'_>,
    strategy: StrategyKind,
    build: B,
    parse: P,
) -> Result<Vec<Product>>
where
    B: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    P: Fn(&[u8]) -> Result<Vec<Product>>,
{
    let attempts = if ctx.rotator.is_empty() {
        1
    } else {
        ctx.config.max_proxy_attempts().min(ctx.rotator.len())
    };

    let mut last_err = anyhow!("no proxy attempts were made");

    for attempt in 0..attempts {
        let proxy = ctx.rotator.next();
        let identity = BrowserIdentity::random();

        let client = match build_http_client(proxy.as_ref(), &identity, ctx.config.http_deadline())
        {
            Ok(client) => client,
            Err(e) => {
                warn!(retailer = ctx.retailer.config.key, "client build failed: {e:#}");
                last_err = e;
                continue;
            }
        };

        let request = match build(&client).build() {
            Ok(request) => request,
            Err(e) => return Err(e).context("failed to build request"),
        };

        let host = extract_host(request.url().as_str()).unwrap_or_default();
        let _permit = ctx.hosts.acquire(host).await;

        debug!(
            retailer = ctx.retailer.config.key,
            strategy = %strategy,
            attempt,
            proxied = proxy.is_some(),
            "dispatching http attempt"
        );

        let response = match client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                last_err = anyhow!(e).context("request failed");
                continue;
            }
        };

        let status = response.status();
        if !status.is_success() {
            last_err = anyhow!("HTTP {status} from {}", ctx.retailer.config.key);
            continue;
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                last_err = anyhow!(e).context("failed to read body");
                continue;
            }
        };

        if let Some(capture) = ctx.capture {
            capture
                .record_payload(ctx.retailer.config.key, strategy, "bin", &body)
                .await;
        }

        match parse(&body) {
            Ok(products) if !products.is_empty() => return Ok(products),
            Ok(_) => {
                last_err = anyhow!("parse yielded no products");
            }
            Err(e) => {
                last_err = e.context("parse failed");
            }
        }
    }

    Err(last_err)
}
