//! Browser automation strategy with network sniffing.
//!
//! Leases a pooled context, installs network observers *before*
//! navigation so every XHR/fetch response the page itself consumed is
//! captured, then navigates to the retailer's human-facing search URL.
//! Extraction runs in three tiers: embedded state JSON from the rendered
//! HTML, captured API payloads through the retailer parser, and finally a
//! DOM scrape over the selector map.

use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, GetResponseBodyParams, ResourceType,
};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::page::Page;
use futures::StreamExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use super::{AttemptContext, Strategy, dom_scrape, embedded_json, fill_template};
use crate::identity::BrowserIdentity;
use crate::models::{Product, StrategyKind};
use crate::utils::humanized_delay;

/// One captured network response, buffered during navigation and drained
/// synchronously afterwards.
#[derive(Debug, Clone)]
struct SniffedResponse {
    request_id: chromiumoxide::cdp::browser_protocol::network::RequestId,
    url: String,
    mime_type: String,
}

/// URL substrings that suggest a response is worth parsing.
const API_URL_HINTS: &[&str] = &["search", "api", "graphql", "suggest", "autocomplete", "product"];

pub struct BrowserSniff;

impl Strategy for BrowserSniff {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BrowserSniff
    }

    fn fetch<'a>(&'a self, ctx: &'a AttemptContext<'a>) -> BoxFuture<'a, Result<Vec<Product>>> {
        Box::pin(async move {
            let identity = BrowserIdentity::random();
            let mut lease = ctx
                .pool
                .lease("chromium", &identity)
                .await
                .context("failed to lease browser context")?;

            let result = sniff_search(ctx, lease.page()).await;

            // A dead CDP channel poisons the context for every later
            // leaseholder; close it rather than returning it.
            if let Err(e) = &result {
                let message = format!("{e:#}").to_lowercase();
                if message.contains("channel") || message.contains("websocket") || message.contains("target") {
                    lease.mark_broken();
                }
            }

            result
        })
    }
}

async fn sniff_search(ctx: &AttemptContext<'_>, page: &Page) -> Result<Vec<Product>> {
    let retailer = ctx.retailer;
    let search_url = url::Url::parse(&fill_template(retailer.config.search_url, ctx.query))
        .context("retailer search url template produced an invalid URL")?;
    let delay_range = ctx.config.action_delay_ms();

    // Observers must be live before goto or early XHRs are lost.
    page.execute(EnableParams::default())
        .await
        .context("failed to enable network domain")?;

    let buffer: Arc<Mutex<Vec<SniffedResponse>>> = Arc::new(Mutex::new(Vec::new()));
    let mut events = page
        .event_listener::<EventResponseReceived>()
        .await
        .context("failed to install network observer")?;

    let collector_buffer = Arc::clone(&buffer);
    let collector = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let interesting = matches!(event.r#type, ResourceType::Xhr | ResourceType::Fetch)
                || event.response.mime_type.contains("json");
            if interesting {
                collector_buffer.lock().await.push(SniffedResponse {
                    request_id: event.request_id.clone(),
                    url: event.response.url.clone(),
                    mime_type: event.response.mime_type.clone(),
                });
            }
        }
    });

    debug!(retailer = retailer.config.key, url = %search_url, "navigating search page");
    page.goto(search_url.as_str())
        .await
        .context("navigation failed")?;
    page.wait_for_navigation()
        .await
        .context("page load failed")?;

    // Humanized pause before interacting; load-bearing for evasion.
    tokio::time::sleep(humanized_delay(delay_range)).await;

    dismiss_consent(page, retailer.config.consent_selectors).await;

    // Give client-side rendering and late XHRs a beat to settle.
    tokio::time::sleep(humanized_delay(delay_range)).await;

    let html = page.content().await.context("failed to read page content")?;

    if let Some(capture) = ctx.capture {
        capture
            .record_payload(retailer.config.key, StrategyKind::BrowserSniff, "html", html.as_bytes())
            .await;
        let params = CaptureScreenshotParams {
            format: Some(CaptureScreenshotFormat::Png),
            ..Default::default()
        };
        match page.screenshot(params).await {
            Ok(png) => capture.record_screenshot(retailer.config.key, &png).await,
            Err(e) => trace!("screenshot capture failed: {e}"),
        }
    }

    // Tier 1: embedded state in the rendered document.
    if let Some(products) = embedded_json::extract_products(&html, retailer) {
        collector.abort();
        return Ok(products);
    }

    // Tier 2: drain the sniffed responses and run the retailer parser
    // over anything API-shaped until one payload yields products.
    collector.abort();
    let sniffed = {
        let mut guard = buffer.lock().await;
        std::mem::take(&mut *guard)
    };
    debug!(
        retailer = retailer.config.key,
        captured = sniffed.len(),
        "scanning captured network responses"
    );

    for response in &sniffed {
        if !looks_like_api(response) {
            continue;
        }
        let body = match page
            .execute(GetResponseBodyParams::new(response.request_id.clone()))
            .await
        {
            Ok(body) => body,
            Err(e) => {
                trace!(url = %response.url, "response body unavailable: {e}");
                continue;
            }
        };
        let raw = if body.base64_encoded {
            match BASE64.decode(&body.body) {
                Ok(bytes) => bytes,
                Err(_) => continue,
            }
        } else {
            body.body.clone().into_bytes()
        };

        let Ok(payload) = serde_json::from_slice::<Value>(&raw) else {
            continue;
        };
        let products = retailer.parse(&payload);
        if !products.is_empty() {
            debug!(
                retailer = retailer.config.key,
                url = %response.url,
                count = products.len(),
                "sniffed payload yielded products"
            );
            return Ok(products);
        }
    }

    // Tier 3: DOM scrape over the selector map.
    let products = dom_scrape::scrape_products(&html, retailer);
    if products.is_empty() {
        anyhow::bail!(
            "browser strategy exhausted for {}: no embedded state, {} sniffed responses, empty DOM scrape",
            retailer.config.key,
            sniffed.len()
        );
    }
    Ok(products)
}

fn looks_like_api(response: &SniffedResponse) -> bool {
    let url = response.url.to_lowercase();
    response.mime_type.contains("json") || API_URL_HINTS.iter().any(|hint| url.contains(hint))
}

/// Dismiss cookie/consent dialogs: first matching selector wins, the rest
/// are skipped.
async fn dismiss_consent(page: &Page, selectors: &[&str]) {
    for selector in selectors {
        match page.find_element(*selector).await {
            Ok(element) => {
                match element.click().await {
                    Ok(_) => debug!(selector, "dismissed consent dialog"),
                    Err(e) => warn!(selector, "consent click failed: {e}"),
                }
                return;
            }
            Err(_) => continue,
        }
    }
}
