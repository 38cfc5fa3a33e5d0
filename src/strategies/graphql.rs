//! GraphQL strategy.
//!
//! Same transport as the direct API but posts a GraphQL document. Only
//! defined for retailers with a known GraphQL surface; for the rest this
//! strategy is a no-op (empty result, not an error) so the cascade moves
//! on immediately.

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use serde_json::{Value, json};

use super::{AttemptContext, Strategy, execute_with_proxy_rotation};
use crate::models::{Product, StrategyKind};

pub struct GraphQl;

impl Strategy for GraphQl {
    fn kind(&self) -> StrategyKind {
        StrategyKind::GraphQl
    }

    fn fetch<'a>(&'a self, ctx: &'a AttemptContext<'a>) -> BoxFuture<'a, Result<Vec<Product>>> {
        Box::pin(async move {
            let Some(gql) = ctx.retailer.config.graphql else {
                return Ok(Vec::new());
            };

            let document = json!({
                "query": gql.document,
                "variables": {
                    "keyword": ctx.query.raw(),
                    "start": 0,
                }
            });
            let headers = ctx.retailer.config.headers;
            let retailer = ctx.retailer;

            execute_with_proxy_rotation(
                ctx,
                StrategyKind::GraphQl,
                |client| {
                    let mut request = client.post(gql.url).json(&document);
                    for (name, value) in headers {
                        request = request.header(*name, *value);
                    }
                    request
                },
                |body| {
                    let payload: Value =
                        serde_json::from_slice(body).context("graphql payload is not JSON")?;
                    if let Some(errors) = payload.get("errors")
                        && errors.as_array().is_some_and(|e| !e.is_empty())
                    {
                        anyhow::bail!("graphql response carried errors");
                    }
                    Ok(retailer.parse(&payload))
                },
            )
            .await
        })
    }
}
