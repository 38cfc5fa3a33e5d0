//! Embedded-state JSON extraction.
//!
//! Server-rendered retail pages ship their search results inside an inline
//! state object (`window.__INITIAL_STATE__ = {...};` and friends). Each
//! retailer carries an ordered list of `(pattern, path)` pairs; patterns
//! are tried in order and the first blob that parses and yields products
//! wins. Retailers change these formats independently, which is why the
//! table is data on the registry record rather than code here.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use tracing::{debug, trace};

use crate::models::Product;
use crate::normalize::value_at;
use crate::retailers::Retailer;

/// Compiled-pattern cache; patterns are `'static` strings from the catalog.
static PATTERN_CACHE: Lazy<Mutex<HashMap<&'static str, Regex>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn compiled(pattern: &'static str) -> Option<Regex> {
    let mut cache = PATTERN_CACHE.lock();
    if let Some(re) = cache.get(pattern) {
        return Some(re.clone());
    }
    match Regex::new(pattern) {
        Ok(re) => {
            cache.insert(pattern, re.clone());
            Some(re)
        }
        Err(e) => {
            tracing::warn!("invalid embedded-state pattern {pattern:?}: {e}");
            None
        }
    }
}

/// Extract products from inline state JSON in a rendered HTML document.
///
/// Returns `None` when no pattern matched or nothing parsed to a non-empty
/// product list; the caller falls through to its next acquisition step.
#[must_use]
pub fn extract_products(html: &str, retailer: &Retailer) -> Option<Vec<Product>> {
    for entry in retailer.config.embedded {
        let Some(re) = compiled(entry.pattern) else {
            continue;
        };
        let Some(captures) = re.captures(html) else {
            trace!(pattern = entry.pattern, "embedded pattern did not match");
            continue;
        };
        let Some(blob) = captures.get(1) else {
            continue;
        };

        let value: serde_json::Value = match serde_json::from_str(blob.as_str()) {
            Ok(value) => value,
            Err(e) => {
                debug!(
                    retailer = retailer.config.key,
                    pattern = entry.pattern,
                    "embedded blob failed to parse: {e}"
                );
                continue;
            }
        };

        // Hand the parser the subtree the path points at; fall back to the
        // blob root when the path is stale but the shape still matches.
        let subtree = value_at(&value, entry.path).unwrap_or(&value);
        let products = retailer.parse(subtree);
        if !products.is_empty() {
            debug!(
                retailer = retailer.config.key,
                count = products.len(),
                "embedded state extraction succeeded"
            );
            return Some(products);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retailers::RetailerRegistry;

    #[test]
    fn ajio_preloaded_state_extracts() {
        let html = r#"<html><head><script>window.__PRELOADED_STATE__ = {"search":{"searchData":{"products":[{"code":"P1","name":"Slim Jeans","price":"₹1,499","url":"/p/p1"}]}}} ;</script></head><body></body></html>"#;
        let registry = RetailerRegistry::with_defaults();
        let retailer = registry.get("ajio").unwrap();
        let products = extract_products(html, retailer).expect("pattern should match");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price, "1499");
    }

    #[test]
    fn no_match_returns_none() {
        let registry = RetailerRegistry::with_defaults();
        let retailer = registry.get("ajio").unwrap();
        assert!(extract_products("<html><body>captcha</body></html>", retailer).is_none());
    }

    #[test]
    fn unparseable_blob_falls_through() {
        let html = r#"window.__PRELOADED_STATE__ = {broken json} ;</script>"#;
        let registry = RetailerRegistry::with_defaults();
        let retailer = registry.get("ajio").unwrap();
        assert!(extract_products(html, retailer).is_none());
    }
}
