//! Direct retailer API strategy.
//!
//! Fastest path: the retailer's own JSON search endpoint, hit the way the
//! retailer's frontend hits it. Request shape varies per retailer (query
//! string vs JSON body); headers come from the registry record.

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use serde_json::Value;

use super::{AttemptContext, Strategy, execute_with_proxy_rotation, fill_template};
use crate::models::{Product, StrategyKind};
use crate::retailers::RequestShape;

pub struct DirectApi;

impl Strategy for DirectApi {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DirectApi
    }

    fn fetch<'a>(&'a self, ctx: &'a AttemptContext<'a>) -> BoxFuture<'a, Result<Vec<Product>>> {
        Box::pin(async move {
            let Some(api) = ctx.retailer.config.direct_api else {
                // Retailer has no direct API; nothing to try here.
                return Ok(Vec::new());
            };

            let url = fill_template(api.url, ctx.query);
            let headers = ctx.retailer.config.headers;
            let retailer = ctx.retailer;

            execute_with_proxy_rotation(
                ctx,
                StrategyKind::DirectApi,
                |client| {
                    let mut request = match api.shape {
                        RequestShape::QueryString => client.get(&url),
                        RequestShape::JsonBody => {
                            let body = api.body.map(|t| fill_template(t, ctx.query)).unwrap_or_default();
                            client.post(&url).body(body)
                        }
                    };
                    for (name, value) in headers {
                        request = request.header(*name, *value);
                    }
                    request
                },
                |body| {
                    let payload: Value =
                        serde_json::from_slice(body).context("direct api payload is not JSON")?;
                    Ok(retailer.parse(&payload))
                },
            )
            .await
        })
    }
}
