//! Retailer registry: static per-retailer configuration plus parser lookup.
//!
//! Each retailer is described by a static record (URL templates, headers,
//! DOM selectors, embedded-state patterns) consumed read-only by the
//! strategy executors, and a parser resolved once at registry construction.
//! Endpoints and selectors are configuration, not logic; retailers change
//! them independently of everything else in this crate.

mod catalog;
pub mod parsers;

pub use catalog::default_retailer_configs;

use std::collections::HashMap;

use serde_json::Value;

use crate::models::Product;

/// CSS selector map for the DOM-scrape fallback.
///
/// `container` matches one listing card; the sub-selectors resolve inside
/// it. Cards missing a name or price are dropped.
#[derive(Debug, Clone, Copy)]
pub struct DomSelectors {
    pub container: &'static str,
    pub name: &'static str,
    pub price: &'static str,
    pub original_price: Option<&'static str>,
    pub image: &'static str,
    pub link: &'static str,
    pub rating: Option<&'static str>,
}

/// One embedded-state extraction attempt: a regex with a single capture
/// group that isolates a JSON blob in the page HTML, and the dotted path
/// from that blob's root to the product array.
///
/// Patterns are tried in order; first successful parse wins. Kept as data
/// because retailers rev their embedded-state format independently.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedPattern {
    pub pattern: &'static str,
    pub path: &'static str,
}

/// How the direct API wants the query delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// Query interpolated into the URL template.
    QueryString,
    /// POST with a JSON body template (`{query}` placeholder).
    JsonBody,
}

#[derive(Debug, Clone, Copy)]
pub struct DirectApiConfig {
    pub url: &'static str,
    pub shape: RequestShape,
    /// Body template for `RequestShape::JsonBody`.
    pub body: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
pub struct GraphqlConfig {
    pub url: &'static str,
    pub document: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct HarvestedConfig {
    /// Autocomplete/suggestion/recommendation endpoint, `{query}` template.
    pub url: &'static str,
    /// True when the endpoint answers HTML that embeds state JSON rather
    /// than a JSON payload.
    pub html: bool,
}

/// Static description of one retailer. All strategy executors read this
/// and nothing else retailer-specific.
#[derive(Debug, Clone, Copy)]
pub struct RetailerConfig {
    pub key: &'static str,
    pub name: &'static str,
    pub origin: &'static str,
    /// Human-facing search page, `{query}` template. Browser strategy target.
    pub search_url: &'static str,
    pub direct_api: Option<DirectApiConfig>,
    pub graphql: Option<GraphqlConfig>,
    pub harvested: Option<HarvestedConfig>,
    pub headers: &'static [(&'static str, &'static str)],
    pub dom: DomSelectors,
    pub embedded: &'static [EmbeddedPattern],
    /// Cookie/consent dismissal selectors, highest priority first.
    pub consent_selectors: &'static [&'static str],
}

/// Parser from a retailer payload (API response root, embedded-state
/// subtree, or bare product array) to normalized products.
pub type PayloadParser = fn(&Value, &RetailerConfig) -> Vec<Product>;

/// A retailer with its parser resolved.
#[derive(Clone, Copy)]
pub struct Retailer {
    pub config: &'static RetailerConfig,
    pub parser: PayloadParser,
}

impl Retailer {
    /// Run the payload parser.
    #[must_use]
    pub fn parse(&self, payload: &Value) -> Vec<Product> {
        (self.parser)(payload, self.config)
    }
}

impl std::fmt::Debug for Retailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retailer").field("key", &self.config.key).finish()
    }
}

/// Registry mapping retailer key to its resolved implementation set.
///
/// Built once at engine startup; the orchestrator iterates `keys()` in
/// registration order.
pub struct RetailerRegistry {
    map: HashMap<&'static str, Retailer>,
    order: Vec<&'static str>,
}

impl RetailerRegistry {
    /// Full default catalog.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut map = HashMap::new();
        let mut order = Vec::new();
        for config in default_retailer_configs() {
            let parser = parsers::parser_for(config.key);
            map.insert(config.key, Retailer { config, parser });
            order.push(config.key);
        }
        Self { map, order }
    }

    /// Restrict the registry to the given keys, preserving registration
    /// order. Unknown keys are ignored.
    #[must_use]
    pub fn restricted_to(mut self, keys: &[String]) -> Self {
        let wanted: Vec<&'static str> = self
            .order
            .iter()
            .copied()
            .filter(|k| keys.iter().any(|w| w == k))
            .collect();
        self.map.retain(|k, _| wanted.contains(k));
        self.order = wanted;
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Retailer> {
        self.map.get(key)
    }

    /// Retailer keys in registration order.
    #[must_use]
    pub fn keys(&self) -> &[&'static str] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
