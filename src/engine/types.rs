//! Error types and failure classification for the fetch engine.
//!
//! Strategy-level failures never leave the cascade; what surfaces here is
//! the thin taxonomy the orchestrator and retry wrapper actually branch on.

use std::fmt;

/// Error type for the top-level search API.
///
/// Individual retailer failures are swallowed into the aggregate result;
/// only configuration-class problems reach the caller as an error.
#[derive(Debug, Clone)]
pub enum SearchError {
    /// Engine configuration is invalid or empty
    ConfigError(String),
    /// No retailers configured at all (the only fatal search condition)
    NoRetailers,
    /// Browser infrastructure error
    BrowserError(String),
    /// Operation cancelled
    Cancelled,
    /// Other errors
    Other(String),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
            Self::NoRetailers => write!(f, "No retailers configured"),
            Self::BrowserError(msg) => write!(f, "Browser error: {msg}"),
            Self::Cancelled => write!(f, "Search operation was cancelled"),
            Self::Other(msg) => write!(f, "Search error: {msg}"),
        }
    }
}

impl std::error::Error for SearchError {}

impl From<anyhow::Error> for SearchError {
    fn from(err: anyhow::Error) -> Self {
        // Use {:#} to preserve full error chain with context
        Self::Other(format!("{err:#}"))
    }
}

/// Convenience alias for Result with `SearchError`
pub type SearchResult<T> = Result<T, SearchError>;

/// Categorizes retailer-attempt failures for retry decisions.
///
/// A retry re-runs the full cascade from strategy 1, so the only question
/// this answers is "is another identity/proxy worth trying at all".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network-level failure (timeout, DNS, connection refused)
    Network,
    /// Browser/page failure (crash, pool exhaustion, CDP error)
    Browser,
    /// Payload didn't parse into products
    Parse,
    /// Rate limiting detected (HTTP 429, captcha wall)
    RateLimited,
    /// Retailer missing from the registry; retrying cannot help
    NotConfigured,
    /// Unknown/unclassified error
    Unknown,
}

impl FailureKind {
    /// Classify an error message into a failure kind.
    ///
    /// Works on the rendered message rather than error types because the
    /// causes cross three crates (reqwest, chromiumoxide, serde_json) and
    /// the cascade has already flattened them to strings.
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let msg = message.to_lowercase();

        if msg.contains("not configured") || msg.contains("unknown retailer") {
            return Self::NotConfigured;
        }

        if msg.contains("429") || msg.contains("too many requests") || msg.contains("rate limit") || msg.contains("captcha") {
            return Self::RateLimited;
        }

        if msg.contains("timeout")
            || msg.contains("timed out")
            || msg.contains("connection refused")
            || msg.contains("connection reset")
            || msg.contains("dns")
            || msg.contains("network")
            || msg.contains("unreachable")
        {
            return Self::Network;
        }

        if msg.contains("browser")
            || msg.contains("page")
            || msg.contains("chrome")
            || msg.contains("cdp")
            || msg.contains("target")
            || msg.contains("session")
        {
            return Self::Browser;
        }

        if msg.contains("parse") || msg.contains("json") || msg.contains("selector") || msg.contains("deserialize") {
            return Self::Parse;
        }

        Self::Unknown
    }

    /// Whether a fresh cascade attempt (new proxy, new identity) is worth it.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network | Self::Browser | Self::RateLimited | Self::Parse | Self::Unknown => true,
            Self::NotConfigured => false,
        }
    }
}
