//! Severity computation for metrics, accounts and the whole app.
//!
//! Everything here is pure. Reductions always go through [`LimitStatus`]'s
//! severity ordering.

use super::types::{AccountSnapshot, LimitMetric, LimitStatus, MetricStatus, OverallStatus};
use serde::{Deserialize, Serialize};

/// Remaining capacity at or below this fraction of the limit is a warning.
pub const WARNING_REMAINING_RATIO: f64 = 0.20;

/// Status from a limit and the capacity left in it.
pub fn metric_status_remaining(limit: Option<f64>, remaining: Option<f64>) -> MetricStatus {
    let Some(limit) = limit.filter(|l| *l > 0.0) else {
        return LimitStatus::Unknown;
    };
    let Some(remaining) = remaining else {
        return LimitStatus::Unknown;
    };
    if remaining <= 0.0 {
        return LimitStatus::Exhausted;
    }
    if remaining / limit <= WARNING_REMAINING_RATIO {
        LimitStatus::Warning
    } else {
        LimitStatus::Ok
    }
}

/// Status from a limit and the consumption so far.
pub fn metric_status_used(limit: Option<f64>, used: Option<f64>) -> MetricStatus {
    match (limit, used) {
        (Some(limit), Some(used)) => metric_status_remaining(Some(limit), Some(limit - used)),
        _ => LimitStatus::Unknown,
    }
}

/// Worst status across `metrics`, or `fallback` when there are none.
pub fn overall_status(metrics: &[LimitMetric], fallback: OverallStatus) -> OverallStatus {
    metrics.iter().map(|m| m.status).max().unwrap_or(fallback)
}

/// Number of accounts needing attention (warning, exhausted or error).
pub fn warning_count(snapshots: &[AccountSnapshot]) -> usize {
    snapshots.iter().filter(|s| s.status.is_alerting()).count()
}

/// Worst account status; `Unknown` when nothing is configured.
pub fn overall_app_status(snapshots: &[AccountSnapshot]) -> OverallStatus {
    if snapshots.is_empty() {
        return LimitStatus::Unknown;
    }
    snapshots
        .iter()
        .map(|s| s.status)
        .fold(LimitStatus::Ok, std::cmp::max)
}

/// How per-account utilization is combined into one indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    #[default]
    Worst,
    Average,
}

impl std::str::FromStr for AggregationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "worst" | "max" => Ok(AggregationMode::Worst),
            "average" | "avg" | "mean" => Ok(AggregationMode::Average),
            other => Err(format!("unknown aggregation mode: {}", other)),
        }
    }
}

/// Combined utilization across accounts as a rounded percentage.
///
/// Accounts without a displayable ratio are left out; `None` when no account
/// has one.
pub fn aggregate_utilization_percent(
    snapshots: &[AccountSnapshot],
    mode: AggregationMode,
) -> Option<u8> {
    let ratios: Vec<f64> = snapshots
        .iter()
        .filter_map(AccountSnapshot::utilization)
        .collect();
    if ratios.is_empty() {
        return None;
    }
    let combined = match mode {
        AggregationMode::Worst => ratios.iter().copied().fold(0.0, f64::max),
        AggregationMode::Average => ratios.iter().sum::<f64>() / ratios.len() as f64,
    };
    Some(ratio_to_percent(combined))
}

/// Ratio in [0, 1] to a percentage, rounding half away from zero.
pub fn ratio_to_percent(ratio: f64) -> u8 {
    (ratio.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
#[path = "tests/status_tests.rs"]
mod tests;
