//! Harvested-endpoint strategy.
//!
//! Targets alternate or undocumented endpoints discovered by watching the
//! retailer's own traffic: autocomplete APIs, suggestion services,
//! recommendation feeds. Cheaper and less defended than the main search
//! API, but shapes drift without notice. Endpoints that answer HTML are
//! routed through the embedded-state extractor instead of the JSON parser.

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use serde_json::Value;

use super::{AttemptContext, Strategy, embedded_json, execute_with_proxy_rotation, fill_template};
use crate::models::{Product, StrategyKind};

pub struct Harvested;

impl Strategy for Harvested {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Harvested
    }

    fn fetch<'a>(&'a self, ctx: &'a AttemptContext<'a>) -> BoxFuture<'a, Result<Vec<Product>>> {
        Box::pin(async move {
            let Some(harvested) = ctx.retailer.config.harvested else {
                return Ok(Vec::new());
            };

            let url = fill_template(harvested.url, ctx.query);
            let headers = ctx.retailer.config.headers;
            let retailer = ctx.retailer;

            execute_with_proxy_rotation(
                ctx,
                StrategyKind::Harvested,
                |client| {
                    let mut request = client.get(&url);
                    for (name, value) in headers {
                        request = request.header(*name, *value);
                    }
                    request
                },
                |body| {
                    if harvested.html {
                        let html = std::str::from_utf8(body)
                            .context("harvested HTML response is not UTF-8")?;
                        return Ok(embedded_json::extract_products(html, retailer)
                            .unwrap_or_default());
                    }
                    let payload: Value = serde_json::from_slice(body)
                        .context("harvested payload is not JSON")?;
                    Ok(retailer.parse(&payload))
                },
            )
            .await
        })
    }
}
