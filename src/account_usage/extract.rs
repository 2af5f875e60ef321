//! Loose extraction helpers over untyped provider payloads.
//!
//! Provider usage reports change shape often, so instead of strict structs the
//! adapters scan the decoded `serde_json::Value` tree for known keys.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Numeric value of a JSON node: integers, floats and numeric strings.
///
/// Booleans, null, objects and arrays are not numbers.
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Sums the numeric values of every key in `keys`, anywhere in the tree.
///
/// Matched values are still descended into, so a matched key nested under
/// another matched key is counted twice:
/// `{"request_count": 5, "nested": {"request_count": 3}}` sums to 8.
/// Provider payloads have not been seen to nest this way; keep it that way
/// until one does.
pub fn sum_numeric(keys: &[&str], node: &Value) -> f64 {
    match node {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| {
                let own = if keys.contains(&key.as_str()) {
                    numeric(value).unwrap_or(0.0)
                } else {
                    0.0
                };
                own + sum_numeric(keys, value)
            })
            .sum(),
        Value::Array(items) => items.iter().map(|item| sum_numeric(keys, item)).sum(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => 0.0,
    }
}

/// Sums USD cost figures found under `keys`.
///
/// With `nested_amount`, an `amount` object contributes its `value` field and
/// is not scanned further (OpenAI cost buckets carry
/// `{"amount": {"value": 0.42, "currency": "usd"}}`). Flat keys sitting next
/// to such an `amount` are fallbacks and are skipped in that object.
pub fn sum_cost_usd(node: &Value, keys: &[&str], nested_amount: bool) -> f64 {
    match node {
        Value::Object(map) => {
            let has_amount = nested_amount && matches!(map.get("amount"), Some(Value::Object(_)));
            map.iter()
                .map(|(key, value)| {
                    if has_amount && key == "amount" {
                        return value.get("value").and_then(numeric).unwrap_or(0.0);
                    }
                    let own = if !has_amount && keys.contains(&key.as_str()) {
                        numeric(value).unwrap_or(0.0)
                    } else {
                        0.0
                    };
                    own + sum_cost_usd(value, keys, nested_amount)
                })
                .sum()
        }
        Value::Array(items) => items
            .iter()
            .map(|item| sum_cost_usd(item, keys, nested_amount))
            .sum(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => 0.0,
    }
}

/// Parses a decimal setting such as a budget: `"25"`, `" 12.5 "`, `"$40"`.
pub fn parse_decimal_setting(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn compound_duration_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+(?:\.\d+)?)s)?(?:(\d+)ms)?$").ok()
    })
    .as_ref()
}

fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Duration::try_milliseconds((seconds * 1000.0).round() as i64)
}

/// Compound Go-style durations as sent in `x-ratelimit-reset-*`: `6m0s`, `1h2m3s`, `20ms`.
fn parse_compound_duration(s: &str) -> Option<Duration> {
    let caps = compound_duration_re()?.captures(s)?;
    if caps.iter().skip(1).all(|g| g.is_none()) {
        return None;
    }
    let part = |idx: usize| -> f64 {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    let seconds = part(1) * 3600.0 + part(2) * 60.0 + part(3) + part(4) / 1000.0;
    seconds_to_duration(seconds)
}

/// Resolves a rate-limit reset value to an absolute time.
///
/// Accepted forms, first match wins: bare seconds (`"60"`), milliseconds
/// (`"45000ms"`), seconds (`"30s"`), compound durations (`"1m30s"`), and
/// RFC 3339 timestamps. Anything else, or an offset past the last
/// representable instant, is `None`.
pub fn parse_reset(value: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let s = value.trim();
    if s.is_empty() {
        return None;
    }

    let after = |d: Duration| now.checked_add_signed(d);

    if let Ok(seconds) = s.parse::<f64>() {
        return seconds_to_duration(seconds).and_then(after);
    }

    if let Some(ms) = s.strip_suffix("ms") {
        if let Ok(ms) = ms.trim().parse::<f64>() {
            return seconds_to_duration(ms / 1000.0).and_then(after);
        }
    }

    if let Some(secs) = s.strip_suffix('s') {
        if let Ok(secs) = secs.trim().parse::<f64>() {
            return seconds_to_duration(secs).and_then(after);
        }
    }

    if let Some(d) = parse_compound_duration(s) {
        return after(d);
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
#[path = "tests/extract_tests.rs"]
mod tests;
