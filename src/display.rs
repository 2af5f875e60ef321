//! Text and JSON rendering of a refresh.

use crate::account_usage::status::AggregationMode;
use crate::account_usage::types::{AccountSnapshot, LimitMetric, OverallStatus};
use crate::scheduler::RefreshView;
use crate::usage_reset::{format_countdown, pace, time_until};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

/// Machine-readable form of a [`RefreshView`].
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub status: OverallStatus,
    pub warning_count: usize,
    pub utilization_percent: Option<u8>,
    pub aggregation: AggregationMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_error: Option<&'a str>,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub accounts: &'a [AccountSnapshot],
}

impl<'a> Report<'a> {
    pub fn new(view: &'a RefreshView) -> Self {
        Self {
            status: view.app_status(),
            warning_count: view.warning_count(),
            utilization_percent: view.utilization_percent(),
            aggregation: view.display.aggregation,
            config_error: view.config_error.as_deref(),
            refreshed_at: view.refreshed_at,
            accounts: &view.snapshots,
        }
    }
}

pub fn render_json(view: &RefreshView) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Report::new(view))
}

/// Header line, then one block per account.
pub fn render_text(view: &RefreshView, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let percent = view
        .utilization_percent()
        .map(|p| format!("{}%", p))
        .unwrap_or_else(|| "--".to_string());
    let _ = writeln!(
        out,
        "[{}] {} account(s), {} need attention, {} used ({})",
        view.app_status().label().to_uppercase(),
        view.snapshots.len(),
        view.warning_count(),
        percent,
        aggregation_label(view.display.aggregation),
    );

    if let Some(error) = &view.config_error {
        let _ = writeln!(out, "config error: {}", error);
        return out;
    }
    if view.snapshots.is_empty() {
        let _ = writeln!(out, "no accounts configured");
        return out;
    }

    for snapshot in &view.snapshots {
        render_account(&mut out, snapshot, view.display.show_details, now);
    }
    out
}

fn aggregation_label(mode: AggregationMode) -> &'static str {
    match mode {
        AggregationMode::Worst => "worst",
        AggregationMode::Average => "average",
    }
}

fn render_account(out: &mut String, snapshot: &AccountSnapshot, details: bool, now: DateTime<Utc>) {
    let _ = writeln!(
        out,
        "\n{} ({}, {}) - {}",
        snapshot.display_name,
        snapshot.provider,
        snapshot.source.summary,
        snapshot.status
    );
    if !details {
        return;
    }
    for metric in &snapshot.metrics {
        let _ = writeln!(out, "  {}", metric_line(metric, now));
    }
    for detail in &snapshot.source.details {
        let _ = writeln!(out, "  ! {}", detail);
    }
}

pub fn metric_line(metric: &LimitMetric, now: DateTime<Utc>) -> String {
    let mut line = format!("{:<22} {}", metric.name, amount(metric));
    if let Some(ratio) = metric.utilization() {
        let _ = write!(line, " ({:.0}%)", ratio * 100.0);
    }
    if let Some(left) = time_until(metric.reset_at, now) {
        let _ = write!(line, ", resets in {}", format_countdown(Some(left)));
    }
    if let Some(label) = pace(metric, now).label() {
        let _ = write!(line, ", {}", label);
    }
    let _ = write!(line, " [{}]", metric.status);
    line
}

fn amount(metric: &LimitMetric) -> String {
    let unit = metric.unit.as_str();
    let text = match (metric.used, metric.limit) {
        (Some(used), Some(limit)) => format!("{} / {} {}", number(used), number(limit), unit),
        (Some(used), None) => format!("{} {}", number(used), unit),
        (None, Some(limit)) => format!("limit {} {}", number(limit), unit),
        (None, None) => "-".to_string(),
    };
    text.trim_end().to_string()
}

fn number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}
