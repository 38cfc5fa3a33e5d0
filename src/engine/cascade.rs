//! Per-retailer strategy cascade.
//!
//! Tries the acquisition strategies in fixed priority order and stops at
//! the first non-empty result. Strategy errors (timeouts, non-200s, parse
//! failures) are caught here and treated as "this strategy yielded
//! nothing"; they never propagate past the cascade.

use tracing::{debug, warn};

use crate::models::{RetailerOutcome, StrategyResult};
use crate::strategies::{AttemptContext, BrowserSniff, DirectApi, GraphQl, Harvested, Strategy};

/// Full strategy set in cascade priority order.
#[must_use]
pub fn default_strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(DirectApi),
        Box::new(GraphQl),
        Box::new(Harvested),
        Box::new(BrowserSniff),
    ]
}

/// HTTP-only strategy set for the orchestrator's fast path. Browser work
/// is deferred to the batched fallback.
#[must_use]
pub fn fast_strategies() -> Vec<Box<dyn Strategy>> {
    vec![Box::new(DirectApi), Box::new(GraphQl), Box::new(Harvested)]
}

/// Run one cascade pass over the given strategies.
///
/// Each strategy gets a deadline by transport class; on timeout the
/// in-flight future is dropped, which releases any leased browser context
/// through its guard.
pub async fn run_cascade(
    ctx: &AttemptContext<'_>,
    strategies: &[Box<dyn Strategy>],
) -> RetailerOutcome {
    let key = ctx.retailer.config.key;
    let mut last_error: Option<String> = None;

    for strategy in strategies {
        let kind = strategy.kind();
        let deadline = if kind.uses_browser() {
            ctx.config.browser_deadline()
        } else {
            ctx.config.http_deadline()
        };

        match tokio::time::timeout(deadline, strategy.fetch(ctx)).await {
            Ok(Ok(products)) => {
                let result = StrategyResult::new(kind, products);
                if result.succeeded() {
                    debug!(
                        retailer = key,
                        strategy = %kind,
                        count = result.products.len(),
                        "cascade resolved"
                    );
                    return RetailerOutcome::success(key.to_string(), kind, result.products);
                }
                // Empty is failure: an anti-bot page and a real zero-result
                // page look identical here, so keep cascading.
                debug!(retailer = key, strategy = %kind, "strategy yielded nothing");
            }
            Ok(Err(e)) => {
                warn!(retailer = key, strategy = %kind, "strategy failed: {e:#}");
                last_error = Some(format!("{kind}: {e:#}"));
            }
            Err(_) => {
                warn!(
                    retailer = key,
                    strategy = %kind,
                    "strategy timed out after {deadline:?}"
                );
                last_error = Some(format!("{kind}: timed out after {deadline:?}"));
            }
        }
    }

    RetailerOutcome::failure(key.to_string(), last_error)
}
