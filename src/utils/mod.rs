//! Small shared helpers: host extraction, humanized delays, constants.

pub mod constants;

pub use constants::*;

use rand::Rng;
use std::time::Duration;

/// Extract the host from a URL for per-host limiting.
///
/// Deliberately string-based rather than `url::Url` so malformed harvested
/// endpoints still map to a stable key instead of erroring.
#[inline]
#[must_use]
pub fn extract_host(url: &str) -> Option<String> {
    let after_scheme = match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    };
    let host_end = after_scheme
        .find(['/', '?', '#', ':'])
        .unwrap_or(after_scheme.len());
    let host = &after_scheme[..host_end];
    if host.is_empty() {
        return None;
    }
    let normalized = host.strip_prefix("www.").filter(|h| !h.is_empty()).unwrap_or(host);
    Some(normalized.to_lowercase())
}

/// Pick a jittered delay from the configured humanization range.
///
/// These pauses imitate human pacing between browser actions. They are
/// load-bearing for detection evasion and must not be optimized away.
#[must_use]
pub fn humanized_delay(range_ms: (u64, u64)) -> Duration {
    let (lo, hi) = range_ms;
    if hi <= lo {
        return Duration::from_millis(lo);
    }
    Duration::from_millis(rand::rng().random_range(lo..hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_host_normalizes() {
        assert_eq!(extract_host("https://www.amazon.in/s?k=x").as_deref(), Some("amazon.in"));
        assert_eq!(extract_host("https://api.croma.com:443/v2").as_deref(), Some("api.croma.com"));
        assert_eq!(extract_host("flipkart.com/search"), Some("flipkart.com".to_string()));
        assert_eq!(extract_host("https://"), None);
    }

    #[test]
    fn delay_stays_in_range() {
        for _ in 0..50 {
            let d = humanized_delay((100, 400));
            assert!(d >= Duration::from_millis(100) && d < Duration::from_millis(400));
        }
        assert_eq!(humanized_delay((250, 250)), Duration::from_millis(250));
    }
}
