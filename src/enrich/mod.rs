//! Post-hoc enrichment seam.
//!
//! An optional collaborator that turns a normalized product list into
//! narrative text (summaries, comparisons). The engine never depends on
//! this succeeding; the default implementation is a no-op.

use anyhow::Result;
use futures::future::BoxFuture;

use crate::models::Product;

/// Accepts the engine's normalized products and returns narrative text.
pub trait Enricher: Send + Sync {
    fn enrich<'a>(
        &'a self,
        products: &'a [Product],
        raw_html: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String>>;
}

/// Default enricher: contributes nothing.
pub struct NoopEnricher;

impl Enricher for NoopEnricher {
    fn enrich<'a>(
        &'a self,
        _products: &'a [Product],
        _raw_html: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async { Ok(String::new()) })
    }
}
