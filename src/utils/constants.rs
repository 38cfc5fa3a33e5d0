//! Shared configuration constants for shopscout
//!
//! Default values used throughout the codebase to ensure consistency and
//! avoid magic numbers.

/// Default global cap on concurrently-executing retailer cascades.
///
/// Three keeps total outbound pressure (HTTP + browser) low enough that a
/// shared residential proxy pool doesn't trip volume-based rate limits.
pub const DEFAULT_MAX_CONCURRENT_RETAILERS: usize = 3;

/// Default early-exit product-count threshold.
///
/// Once the aggregate crosses this many products the orchestrator stops
/// waiting for slower retailers; latency beats completeness for a search UI.
pub const DEFAULT_EARLY_EXIT_THRESHOLD: usize = 15;

/// Default response-cache TTL: 5 minutes.
///
/// Long enough to absorb repeated identical searches, short enough that
/// price changes don't go stale in a visible way.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default response-cache capacity (entries).
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Deadline for HTTP-transport strategies (direct API, GraphQL, harvested).
pub const DEFAULT_HTTP_DEADLINE_SECS: u64 = 12;

/// Deadline for the browser strategy (navigation + network idle + scrape).
pub const DEFAULT_BROWSER_DEADLINE_SECS: u64 = 28;

/// Total cascade attempts per retailer (1 initial + 2 retries).
pub const DEFAULT_CASCADE_ATTEMPTS: u8 = 3;

/// Fixed base delay between cascade retries, before jitter.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 750;

/// Maximum proxies tried sequentially by an HTTP strategy attempt.
pub const DEFAULT_MAX_PROXY_ATTEMPTS: usize = 3;

/// Default browser-context slots per engine.
///
/// At the cap, lease requests reuse existing contexts round-robin instead
/// of growing the pool; Chrome memory is the scarce resource here.
pub const DEFAULT_MAX_CONTEXTS: usize = 3;

/// Close idle contexts older than this during the cleanup sweep.
pub const DEFAULT_CONTEXT_MAX_AGE_SECS: u64 = 300;

/// Humanized delay range between browser actions, in milliseconds.
pub const DEFAULT_ACTION_DELAY_MS: (u64, u64) = (180, 850);

/// Maximum DOM containers read by the scrape fallback.
pub const DOM_SCRAPE_CONTAINER_CAP: usize = 20;

/// Chrome user agent used when an identity doesn't override it.
///
/// Updated: 2025-06-10 to Chrome 137 (current stable). Chrome ships a new
/// stable roughly every 4 weeks; refresh quarterly.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.7151.56 Safari/537.36";
