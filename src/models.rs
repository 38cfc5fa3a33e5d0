//! Core data model for product search aggregation.
//!
//! These types flow through the whole engine: a [`SearchQuery`] enters at the
//! top, strategies produce [`Product`]s, the cascade wraps them in a
//! [`StrategyResult`], the retry layer emits a [`RetailerOutcome`] per
//! retailer, and the orchestrator aggregates everything into an
//! [`AggregateResult`].

use serde::{Deserialize, Serialize};

/// A normalized user search string.
///
/// The cache key is the lower-cased, trimmed form of the raw text so that
/// `" AirPods Pro "` and `"airpods pro"` hit the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    raw: String,
    key: String,
}

impl SearchQuery {
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        Self {
            raw: trimmed.to_string(),
            key: trimmed.to_lowercase(),
        }
    }

    /// The trimmed query text as typed by the user.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Normalized cache key (lower-cased, trimmed).
    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.key
    }

    /// The query percent-encoded for use in URL templates.
    #[must_use]
    pub fn encoded(&self) -> String {
        urlencoding::encode(&self.raw).into_owned()
    }
}

/// One normalized product listing.
///
/// A `Product` is only constructed with a non-empty name and a parseable
/// price; parsers drop malformed entries instead of emitting partial
/// records. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Normalized price string (digits and at most one decimal point).
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,
    pub retailer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// Acquisition strategies in cascade priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    DirectApi,
    GraphQl,
    Harvested,
    BrowserSniff,
}

impl StrategyKind {
    /// Stable lowercase label used in logs and capture filenames.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::DirectApi => "direct_api",
            Self::GraphQl => "graphql",
            Self::Harvested => "harvested",
            Self::BrowserSniff => "browser_sniff",
        }
    }

    /// Whether the strategy needs a leased browser context.
    #[must_use]
    pub const fn uses_browser(&self) -> bool {
        matches!(self, Self::BrowserSniff)
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one strategy attempt for one retailer.
///
/// An empty product list is always a failure at this layer: an anti-bot
/// interstitial and a genuine zero-result page are indistinguishable here,
/// so the cascade must keep trying rather than trust an empty 200.
#[derive(Debug, Clone)]
pub struct StrategyResult {
    pub strategy: StrategyKind,
    pub products: Vec<Product>,
}

impl StrategyResult {
    #[must_use]
    pub fn new(strategy: StrategyKind, products: Vec<Product>) -> Self {
        Self { strategy, products }
    }

    /// Success iff at least one product was parsed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        !self.products.is_empty()
    }
}

/// Final outcome for one retailer within one search.
#[derive(Debug, Clone)]
pub struct RetailerOutcome {
    pub retailer: String,
    pub products: Vec<Product>,
    pub succeeded: bool,
    /// Last error seen when all strategies were exhausted.
    pub error: Option<String>,
    /// Strategy that produced the products, when any did.
    pub winning_strategy: Option<StrategyKind>,
}

impl RetailerOutcome {
    #[must_use]
    pub fn success(retailer: String, strategy: StrategyKind, products: Vec<Product>) -> Self {
        Self {
            retailer,
            products,
            succeeded: true,
            error: None,
            winning_strategy: Some(strategy),
        }
    }

    #[must_use]
    pub fn failure(retailer: String, error: Option<String>) -> Self {
        Self {
            retailer,
            products: Vec::new(),
            succeeded: false,
            error,
            winning_strategy: None,
        }
    }
}

/// Aggregate response for one search call.
///
/// This is the inbound contract: callers always receive this shape, never a
/// raw error, for any individual-retailer cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    pub success: bool,
    pub products: Vec<Product>,
    /// Retailers that contributed at least one product.
    pub scraped_retailers: Vec<String>,
    /// Retailers that were attempted and exhausted every strategy.
    pub failed_retailers: Vec<String>,
    pub execution_time_ms: u64,
    /// True when the result was served from the response cache.
    pub cached: bool,
}

impl AggregateResult {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            success: false,
            products: Vec::new(),
            scraped_retailers: Vec::new(),
            failed_retailers: Vec::new(),
            execution_time_ms: 0,
            cached: false,
        }
    }
}
