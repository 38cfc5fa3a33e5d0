//! Egress identity management: proxy rotation and per-attempt browser
//! identities.
//!
//! Every outbound attempt gets the next proxy round-robin plus a freshly
//! randomized identity (user agent, viewport, locale/timezone). Identities
//! are never persisted across attempts; correlation across requests is
//! exactly what fingerprinting looks for.

use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Proxy transport type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyKind {
    Http,
    Socks5,
}

/// One configured egress proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyEndpoint {
    pub url: String,
    pub kind: ProxyKind,
}

impl ProxyEndpoint {
    /// Parse a configured proxy string. Scheme decides the kind; bare
    /// `host:port` entries are treated as HTTP proxies.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(rest) = raw.strip_prefix("socks5://") {
            if rest.is_empty() {
                return None;
            }
            return Some(Self {
                url: raw.to_string(),
                kind: ProxyKind::Socks5,
            });
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Some(Self {
                url: raw.to_string(),
                kind: ProxyKind::Http,
            });
        }
        Some(Self {
            url: format!("http://{raw}"),
            kind: ProxyKind::Http,
        })
    }
}

/// Round-robin proxy selector.
///
/// Process-wide shared; the cursor is the only mutable state and sits
/// behind a cheap sync mutex (never held across an await).
pub struct ProxyRotator {
    proxies: Vec<ProxyEndpoint>,
    cursor: Mutex<usize>,
}

impl ProxyRotator {
    #[must_use]
    pub fn new(proxies: Vec<ProxyEndpoint>) -> Self {
        Self {
            proxies,
            cursor: Mutex::new(0),
        }
    }

    /// Build a rotator from raw config strings, dropping unparseable entries.
    #[must_use]
    pub fn from_strings(raw: &[String]) -> Self {
        let proxies = raw.iter().filter_map(|s| ProxyEndpoint::parse(s)).collect();
        Self::new(proxies)
    }

    /// Next proxy, wrapping around. `None` means direct connection.
    #[must_use]
    pub fn next(&self) -> Option<ProxyEndpoint> {
        if self.proxies.is_empty() {
            return None;
        }
        let mut cursor = self.cursor.lock();
        let proxy = self.proxies[*cursor % self.proxies.len()].clone();
        *cursor = (*cursor + 1) % self.proxies.len();
        Some(proxy)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

/// Curated desktop user agents, rotated per attempt.
const USER_AGENTS: &[&str] = &[
    crate::utils::CHROME_USER_AGENT,
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.7151.56 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.7103.93 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.7103.113 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:139.0) Gecko/20100101 Firefox/139.0",
];

/// Base desktop viewports; each gets small per-attempt jitter so repeated
/// attempts don't share exact screen metrics.
const VIEWPORTS: &[(u32, u32)] = &[(1920, 1080), (1536, 864), (1440, 900), (1366, 768)];

const LOCALES: &[(&str, &str, &str)] = &[
    // (accept-language, locale, timezone)
    ("en-IN,en;q=0.9", "en-IN", "Asia/Kolkata"),
    ("en-US,en;q=0.9", "en-US", "America/New_York"),
    ("en-GB,en;q=0.8", "en-GB", "Europe/London"),
];

/// A randomized browser/user-agent identity for one outbound attempt.
#[derive(Debug, Clone)]
pub struct BrowserIdentity {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub accept_language: String,
    pub locale: String,
    pub timezone: String,
    pub hardware_concurrency: u32,
    pub platform: String,
}

impl BrowserIdentity {
    /// Generate a fresh identity. Called once per attempt regardless of
    /// whether a proxy was selected.
    #[must_use]
    pub fn random() -> Self {
        let mut rng = rand::rng();

        let user_agent = USER_AGENTS[rng.random_range(0..USER_AGENTS.len())].to_string();
        let (base_w, base_h) = VIEWPORTS[rng.random_range(0..VIEWPORTS.len())];
        let viewport = (
            base_w - rng.random_range(0..16),
            base_h - rng.random_range(0..12),
        );
        let (accept_language, locale, timezone) = LOCALES[rng.random_range(0..LOCALES.len())];

        let platform = if user_agent.contains("Macintosh") {
            "MacIntel"
        } else if user_agent.contains("X11") {
            "Linux x86_64"
        } else {
            "Win32"
        };

        Self {
            user_agent,
            viewport,
            accept_language: accept_language.to_string(),
            locale: locale.to_string(),
            timezone: timezone.to_string(),
            hardware_concurrency: [4u32, 8, 8, 12, 16][rng.random_range(0..5)],
            platform: platform.to_string(),
        }
    }
}

/// Build a reqwest client wired to the given proxy and identity.
///
/// One client per attempt: cookies, TLS session and connection pool must
/// not leak between identities.
pub fn build_http_client(
    proxy: Option<&ProxyEndpoint>,
    identity: &BrowserIdentity,
    timeout: Duration,
) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/html;q=0.9, */*;q=0.8"),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&identity.accept_language)
            .context("invalid accept-language header")?,
    );

    let mut builder = reqwest::Client::builder()
        .user_agent(identity.user_agent.clone())
        .default_headers(headers)
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .cookie_store(true);

    if let Some(endpoint) = proxy {
        debug!(proxy = %endpoint.url, "routing attempt through proxy");
        let proxy = reqwest::Proxy::all(&endpoint.url)
            .with_context(|| format!("invalid proxy url: {}", endpoint.url))?;
        builder = builder.proxy(proxy);
    }

    builder.build().context("failed to build http client")
}
