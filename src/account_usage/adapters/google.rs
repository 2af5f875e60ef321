//! Google Generative Language quota limits via the Service Usage API.

use super::{require_secret, FetchContext, PartialFetch};
use crate::account_usage::error::{UsageError, UsageResult};
use crate::account_usage::extract::numeric;
use crate::account_usage::secrets::{GOOGLE_PROJECT, GOOGLE_TOKEN};
use crate::account_usage::transport::HttpRequest;
use crate::account_usage::types::{AccountConfig, AccountSnapshot, LimitMetric, WindowKind};
use serde_json::Value;

pub const API_BASE: &str = "https://serviceusage.googleapis.com";
pub const SERVICE: &str = "generativelanguage.googleapis.com";

/// Quota listings run long; only the first few are shown.
pub const MAX_METRICS: usize = 8;

pub fn fetch(account: &AccountConfig, ctx: &FetchContext<'_>) -> AccountSnapshot {
    if super::is_unsupported_subscription(account) {
        return super::not_available_snapshot(account, ctx.now);
    }
    let token = match require_secret(account, ctx, &GOOGLE_TOKEN) {
        Ok(token) => token,
        Err(snapshot) => return snapshot,
    };
    let project = match account.setting("projectId") {
        Some(project) => project.to_string(),
        None => match require_secret(account, ctx, &GOOGLE_PROJECT) {
            Ok(project) => project,
            Err(snapshot) => return snapshot,
        },
    };

    let mut partial = PartialFetch::new();
    match fetch_quota_metrics(ctx, &token, &project) {
        Ok(metrics) => partial.metrics = metrics,
        Err(e) => partial.record_failure(account, "Quota metrics", &e),
    }
    partial.finish(account, &format!("Service Usage quotas ({})", project), ctx.now)
}

pub fn quota_metrics_url(project: &str) -> String {
    format!(
        "{}/v1/projects/{}/services/{}/consumerQuotaMetrics?view=FULL",
        API_BASE, project, SERVICE
    )
}

fn fetch_quota_metrics(
    ctx: &FetchContext<'_>,
    token: &str,
    project: &str,
) -> UsageResult<Vec<LimitMetric>> {
    let request = HttpRequest::get(quota_metrics_url(project)).bearer(token);
    let payload = ctx.get_json(&request)?;
    let metrics = parse_quota_metrics(&payload);
    if metrics.is_empty() {
        return Err(UsageError::Parsing("no quota metrics".to_string()));
    }
    tracing::debug!(project, count = metrics.len(), "google quota metrics parsed");
    Ok(metrics)
}

/// Flattens `metrics[].consumerQuotaLimits[]` into at most [`MAX_METRICS`] metrics.
pub(crate) fn parse_quota_metrics(payload: &Value) -> Vec<LimitMetric> {
    let Some(entries) = payload.get("metrics").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .flat_map(|entry| {
            let name = text(entry, "displayName")
                .or_else(|| text(entry, "metric"))
                .unwrap_or("Quota");
            let entry_unit = text(entry, "unit");
            entry
                .get("consumerQuotaLimits")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .map(move |quota_limit| {
                    let unit = text(quota_limit, "unit").or(entry_unit).unwrap_or("");
                    let metric = LimitMetric::against_used(
                        name,
                        window_from_unit(unit),
                        unit,
                        bucket_limit(quota_limit),
                        None,
                    );
                    // Limits under one quota metric often share name and unit.
                    match text(quota_limit, "name") {
                        Some(limit_name) => metric.with_id(limit_name),
                        None => metric,
                    }
                })
        })
        .take(MAX_METRICS)
        .collect()
}

fn text<'a>(node: &'a Value, key: &str) -> Option<&'a str> {
    node.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// First bucket carrying `effectiveLimit`, else `defaultLimit`.
fn bucket_limit(quota_limit: &Value) -> Option<f64> {
    quota_limit
        .get("quotaBuckets")
        .and_then(Value::as_array)?
        .iter()
        .find_map(|bucket| {
            bucket
                .get("effectiveLimit")
                .and_then(numeric)
                .or_else(|| bucket.get("defaultLimit").and_then(numeric))
        })
}

/// Window from the quota unit. Checked in order: minute, day, week.
pub fn window_from_unit(unit: &str) -> WindowKind {
    let unit = unit.to_ascii_lowercase();
    if unit.contains("minute") {
        WindowKind::RequestsPerMinute
    } else if unit.contains("day") {
        WindowKind::Daily
    } else if unit.contains("week") {
        WindowKind::Weekly
    } else {
        WindowKind::Custom
    }
}

#[cfg(test)]
#[path = "../tests/google_tests.rs"]
mod tests;
