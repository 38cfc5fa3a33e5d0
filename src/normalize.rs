//! Shared field-normalization rules used by every retailer parser.
//!
//! Retail payloads disagree about everything: currency glyphs, thousands
//! separators, relative URLs, rating suffixes, even which key holds the
//! product id. These helpers centralize the rules so the four strategies
//! emit identical `Product` values for identical listings.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref PRICE_STRIP: Regex = Regex::new(r"[^\d,.]").expect("static price regex");
    static ref LEADING_FLOAT: Regex = Regex::new(r"^\s*(\d+(?:\.\d+)?)").expect("static rating regex");
}

/// Normalize a raw price string to digits plus at most one decimal point.
///
/// Strips everything except digits, comma and dot, then removes the
/// thousands commas and any leading/trailing separator debris left behind
/// by a currency label (`"Rs. 1,299"` → `".1,299"` → `"1299"`).
///
/// Returns `None` when nothing numeric survives; callers drop the product.
#[must_use]
pub fn clean_price(raw: &str) -> Option<String> {
    let stripped = PRICE_STRIP.replace_all(raw, "");
    let no_commas = stripped.replace(',', "");
    let trimmed = no_commas.trim_matches('.');

    if trimmed.is_empty() || !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    // A stray inner dot from concatenated labels ("Rs.1.299.00") is not
    // recoverable; keep the first well-formed "int[.frac]" prefix.
    let mut out = String::with_capacity(trimmed.len());
    let mut seen_dot = false;
    for c in trimmed.chars() {
        match c {
            '0'..='9' => out.push(c),
            '.' if !seen_dot => {
                seen_dot = true;
                out.push(c);
            }
            '.' => break,
            _ => unreachable!("stripped above"),
        }
    }
    Some(out.trim_end_matches('.').to_string())
}

/// Parse a rating out of strings like `"4.3 out of 5 stars"`.
///
/// Takes the leading float and discards trailing text; anything that does
/// not start with a number yields `None`.
#[must_use]
pub fn parse_rating(raw: &str) -> Option<f64> {
    LEADING_FLOAT
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|r| r.is_finite())
}

/// Convert a possibly-relative URL to an absolute one against the retailer
/// origin. Already-absolute URLs pass through untouched; protocol-relative
/// URLs get `https:`.
#[must_use]
pub fn absolutize(origin: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{rest}");
    }
    let origin = origin.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{origin}{href}")
    } else {
        format!("{origin}/{href}")
    }
}

/// Try a list of field names in fixed order, returning the first non-empty
/// string value. Numbers are stringified so `"id": 12345` still works.
#[must_use]
pub fn first_string(obj: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match obj.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Walk a dotted path (`"props.initialState.search.products"`) through a
/// JSON value. Path segments that parse as integers index into arrays.
#[must_use]
pub fn value_at<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        if segment.is_empty() {
            continue;
        }
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
