//! OpenAI organization usage, cost and rate limits.

use super::{budget_usd, require_secret, FetchContext, PartialFetch};
use crate::account_usage::error::UsageResult;
use crate::account_usage::extract::{parse_reset, sum_cost_usd, sum_numeric};
use crate::account_usage::secrets::OPENAI_KEY;
use crate::account_usage::transport::{HttpRequest, HttpResponse};
use crate::account_usage::types::{AccountConfig, AccountSnapshot, LimitMetric, WindowKind};

pub const API_BASE: &str = "https://api.openai.com";

const COST_KEYS: &[&str] = &["cost_usd", "total_cost_usd"];
const REQUEST_KEYS: &[&str] = &["num_model_requests", "request_count"];

pub fn fetch(account: &AccountConfig, ctx: &FetchContext<'_>) -> AccountSnapshot {
    if super::is_unsupported_subscription(account) {
        return super::not_available_snapshot(account, ctx.now);
    }
    let key = match require_secret(account, ctx, &OPENAI_KEY) {
        Ok(key) => key,
        Err(snapshot) => return snapshot,
    };

    let mut partial = PartialFetch::new();
    let start = ctx.window_start().timestamp();
    let end = ctx.now.timestamp();

    match fetch_cost(ctx, &key, start, end) {
        Ok(cost) => partial.metrics.push(LimitMetric::against_used(
            "Cost (24h)",
            WindowKind::Daily,
            "usd",
            budget_usd(account),
            Some(cost),
        )),
        Err(e) => partial.record_failure(account, "Costs", &e),
    }

    match fetch_usage(ctx, &key, start, end) {
        Ok(usage) => partial.metrics.extend(usage),
        Err(e) => partial.record_failure(account, "Usage", &e),
    }

    match fetch_rate_limits(ctx, &key) {
        Ok(limits) => partial.metrics.extend(limits),
        Err(e) => partial.record_failure(account, "Models", &e),
    }

    partial.finish(account, "OpenAI organization API", ctx.now)
}

fn fetch_cost(ctx: &FetchContext<'_>, key: &str, start: i64, end: i64) -> UsageResult<f64> {
    let url = format!(
        "{}/v1/organization/costs?start_time={}&end_time={}",
        API_BASE, start, end
    );
    let payload = ctx.get_json(&HttpRequest::get(url).bearer(key))?;
    let cost = sum_cost_usd(&payload, COST_KEYS, true);
    tracing::debug!(cost, "openai cost parsed");
    Ok(cost)
}

fn fetch_usage(
    ctx: &FetchContext<'_>,
    key: &str,
    start: i64,
    end: i64,
) -> UsageResult<Vec<LimitMetric>> {
    let url = format!(
        "{}/v1/organization/usage/completions?start_time={}&end_time={}",
        API_BASE, start, end
    );
    let payload = ctx.get_json(&HttpRequest::get(url).bearer(key))?;
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

/// `/v1/models` carries no useful payload; only its rate-limit headers matter.
fn fetch_rate_limits(ctx: &FetchContext<'_>, key: &str) -> UsageResult<Vec<LimitMetric>> {
    let url = format!("{}/v1/models", API_BASE);
    let response = ctx.get_ok(&HttpRequest::get(url).bearer(key))?;
    Ok(rate_limit_metrics(&response, ctx))
}

fn rate_limit_metrics(response: &HttpResponse, ctx: &FetchContext<'_>) -> Vec<LimitMetric> {
    [
        ("requests", "Requests", WindowKind::RequestsPerMinute, "requests/min"),
        ("tokens", "Tokens", WindowKind::TokensPerMinute, "tokens/min"),
    ]
    .into_iter()
    .filter_map(|(suffix, name, window, unit)| {
        let number = |prefix: &str| {
            response
                .header(&format!("x-ratelimit-{}-{}", prefix, suffix))
                .and_then(|v| v.trim().parse::<f64>().ok())
        };
        let limit = number("limit");
        let remaining = number("remaining");
        if limit.is_none() && remaining.is_none() {
            return None;
        }
        let reset = response
            .header(&format!("x-ratelimit-reset-{}", suffix))
            .and_then(|v| parse_reset(v, ctx.now));
        Some(LimitMetric::against_remaining(name, window, unit, limit, remaining).with_reset(reset))
    })
    .collect()
}

#[cfg(test)]
#[path = "../tests/openai_tests.rs"]
mod tests;
