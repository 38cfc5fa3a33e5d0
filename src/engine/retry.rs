//! Retry wrapper around the strategy cascade.
//!
//! A retry re-runs the *full* cascade from strategy 1, not just the last
//! failed strategy: success is often proxy/identity-dependent, and the
//! rotator hands every attempt a fresh egress.

use rand::Rng;
use tracing::{debug, info};

use super::cascade::run_cascade;
use super::types::FailureKind;
use crate::models::RetailerOutcome;
use crate::strategies::{AttemptContext, Strategy};

/// Run the cascade with bounded retries and a short jittered delay
/// between attempts. Terminal failure classes (retailer not configured)
/// short-circuit immediately.
pub async fn run_cascade_with_retries(
    ctx: &AttemptContext<'_>,
    strategies: &[Box<dyn Strategy>],
) -> RetailerOutcome {
    let attempts = ctx.config.cascade_attempts().max(1);
    let key = ctx.retailer.config.key;

    let mut outcome = run_cascade(ctx, strategies).await;

    for attempt in 1..attempts {
        if outcome.succeeded {
            break;
        }
        if let Some(error) = &outcome.error
            && !FailureKind::classify(error).is_retryable()
        {
            info!(retailer = key, "terminal failure, not retrying: {error}");
            break;
        }

        let jitter = rand::rng().random_range(0..250);
        let delay = ctx.config.retry_delay() + std::time::Duration::from_millis(jitter);
        debug!(
            retailer = key,
            attempt,
            of = attempts,
            "cascade retry in {delay:?}"
        );
        tokio::time::sleep(delay).await;

        outcome = run_cascade(ctx, strategies).await;
    }

    outcome
}
