//! Anthropic Admin API usage and cost reports.

use super::{budget_usd, require_secret, FetchContext, PartialFetch};
use crate::account_usage::error::UsageResult;
use crate::account_usage::extract::{sum_cost_usd, sum_numeric};
use crate::account_usage::secrets::ANTHROPIC_KEY;
use crate::account_usage::transport::HttpRequest;
use crate::account_usage::types::{AccountConfig, AccountSnapshot, LimitMetric, WindowKind};
use chrono::{DateTime, SecondsFormat, Utc};

pub const API_BASE: &str = "https://api.anthropic.com";
pub const API_VERSION: &str = "2023-06-01";

const COST_KEYS: &[&str] = &["cost_usd", "amount_usd"];
const REQUEST_KEYS: &[&str] = &["request_count", "requests"];

pub fn fetch(account: &AccountConfig, ctx: &FetchContext<'_>) -> AccountSnapshot {
    if super::is_unsupported_subscription(account) {
        return super::not_available_snapshot(account, ctx.now);
    }
    let key = match require_secret(account, ctx, &ANTHROPIC_KEY) {
        Ok(key) => key,
        Err(snapshot) => return snapshot,
    };

    let mut partial = PartialFetch::new();
    let starting_at = iso8601(ctx.window_start());
    let ending_at = iso8601(ctx.now);

    match fetch_usage(ctx, &key, &starting_at, &ending_at) {
        Ok(usage) => partial.metrics.extend(usage),
        Err(e) => partial.record_failure(account, "Usage report", &e),
    }

    match fetch_cost(ctx, &key, &starting_at, &ending_at) {
        Ok(cost) => partial.metrics.push(LimitMetric::against_used(
            "Cost (24h)",
            WindowKind::Daily,
            "usd",
            budget_usd(account),
            Some(cost),
        )),
        Err(e) => partial.record_failure(account, "Cost report", &e),
    }

    partial.finish(account, "Anthropic Admin API", ctx.now)
}

fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn request(url: String, key: &str) -> HttpRequest {
    HttpRequest::get(url)
        .header("x-api-key", key)
        .header("anthropic-version", API_VERSION)
}

fn fetch_usage(
    ctx: &FetchContext<'_>,
    key: &str,
    starting_at: &str,
    ending_at: &str,
) -> UsageResult<Vec<LimitMetric>> {
    let url = format!(
        "{}/v1/organizations/usage_report/messages?starting_at={}&ending_at={}",
        API_BASE, starting_at, ending_at
    );
    let payload = ctx.get_json(&request(url, key))?;
    Ok(vec![
        LimitMetric::counted(
            "Requests (24h)",
            WindowKind::Daily,
            "requests",
            sum_numeric(REQUEST_KEYS, &payload),
        ),
        LimitMetric::counted(
            "Input tokens (24h)",
            WindowKind::Daily,
            "tokens",
            sum_numeric(&["input_tokens"], &payload),
        ),
        LimitMetric::counted(
            "Output tokens (24h)",
            WindowKind::Daily,
            "tokens",
            sum_numeric(&["output_tokens"], &payload),
        ),
    ])
}

fn fetch_cost(
    ctx: &FetchContext<'_>,
    key: &str,
    starting_at: &str,
    ending_at: &str,
) -> UsageResult<f64> {
    let url = format!(
        "{}/v1/organizations/cost_report?starting_at={}&ending_at={}",
        API_BASE, starting_at, ending_at
    );
    let payload = ctx.get_json(&request(url, key))?;
    Ok(sum_cost_usd(&payload, COST_KEYS, false))
}

#[cfg(test)]
#[path = "../tests/anthropic_tests.rs"]
mod tests;
