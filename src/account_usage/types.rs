//! Data types for account usage tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Provider an account authenticates against.
///
/// Declaration order is the display order of accounts (see [`Provider::ordinal`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[serde(alias = "open_ai")]
    OpenAi,
    Anthropic,
    #[serde(alias = "gemini")]
    Google,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::Anthropic, Provider::Google];

    /// Position of this provider in the declared order.
    pub fn ordinal(self) -> usize {
        match self {
            Provider::OpenAi => 0,
            Provider::Anthropic => 1,
            Provider::Google => 2,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
            Provider::Google => "Google",
        }
    }

    /// Whether the provider exposes usage for subscription-authenticated sessions.
    ///
    /// None do today: Claude and Codex subscription usage is only visible in
    /// the vendors' own clients, and Gemini subscriptions have no quota API.
    pub fn supports_subscription_usage(self) -> bool {
        match self {
            Provider::OpenAi | Provider::Anthropic | Provider::Google => false,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// How an account is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    #[default]
    Api,
    Subscription,
}

/// One configured identity against a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub id: String,
    pub name: String,
    pub provider: Provider,
    #[serde(default)]
    pub kind: AccountKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "crate::config::loose_string_map")]
    pub settings: BTreeMap<String, String>,
}

fn default_enabled() -> bool {
    true
}

impl AccountConfig {
    pub fn new(id: &str, name: &str, provider: Provider, kind: AccountKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            provider,
            kind,
            enabled: true,
            settings: BTreeMap::new(),
        }
    }

    /// Adds a per-account setting (builder style, mostly for tests and demos).
    pub fn with_setting(mut self, key: &str, value: &str) -> Self {
        self.settings.insert(key.to_string(), value.to_string());
        self
    }

    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// True when the `demo` setting holds a truthy value.
    pub fn is_demo(&self) -> bool {
        self.setting("demo").is_some_and(|v| {
            matches!(
                v.to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
    }
}

/// The time or rate scope a metric measures. Descriptive only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Session,
    Daily,
    Weekly,
    RequestsPerMinute,
    TokensPerMinute,
    RequestsPerDay,
    Custom,
}

impl WindowKind {
    pub fn slug(self) -> &'static str {
        match self {
            WindowKind::Session => "session",
            WindowKind::Daily => "daily",
            WindowKind::Weekly => "weekly",
            WindowKind::RequestsPerMinute => "rpm",
            WindowKind::TokensPerMinute => "tpm",
            WindowKind::RequestsPerDay => "rpd",
            WindowKind::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WindowKind::Session => "Session",
            WindowKind::Daily => "Daily",
            WindowKind::Weekly => "Weekly",
            WindowKind::RequestsPerMinute => "Requests/min",
            WindowKind::TokensPerMinute => "Tokens/min",
            WindowKind::RequestsPerDay => "Requests/day",
            WindowKind::Custom => "Custom",
        }
    }
}

/// Severity of a metric or an account.
///
/// Ordering follows severity, `Ok < Unknown < Warning < Exhausted < Error`,
/// not declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitStatus {
    Ok,
    Warning,
    Exhausted,
    Unknown,
    Error,
}

/// Status of a single metric.
pub type MetricStatus = LimitStatus;
/// Status of an account snapshot or of the whole app.
pub type OverallStatus = LimitStatus;

impl LimitStatus {
    pub fn severity(self) -> u8 {
        match self {
            LimitStatus::Ok => 0,
            LimitStatus::Unknown => 1,
            LimitStatus::Warning => 2,
            LimitStatus::Exhausted => 3,
            LimitStatus::Error => 4,
        }
    }

    /// Warning, exhausted and error count towards the warning badge.
    pub fn is_alerting(self) -> bool {
        matches!(
            self,
            LimitStatus::Warning | LimitStatus::Exhausted | LimitStatus::Error
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            LimitStatus::Ok => "ok",
            LimitStatus::Warning => "warning",
            LimitStatus::Exhausted => "exhausted",
            LimitStatus::Unknown => "unknown",
            LimitStatus::Error => "error",
        }
    }
}

impl Ord for LimitStatus {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl PartialOrd for LimitStatus {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for LimitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One observed or derived quantity within a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitMetric {
    pub id: String,
    pub name: String,
    pub window: WindowKind,
    pub limit: Option<f64>,
    pub used: Option<f64>,
    pub remaining: Option<f64>,
    pub reset_at: Option<DateTime<Utc>>,
    pub unit: String,
    pub status: MetricStatus,
}

impl LimitMetric {
    fn base(name: &str, window: WindowKind, unit: &str, status: MetricStatus) -> Self {
        Self {
            id: metric_id(window, name, unit),
            name: name.to_string(),
            window,
            limit: None,
            used: None,
            remaining: None,
            reset_at: None,
            unit: unit.to_string(),
            status,
        }
    }

    /// A raw count with no known ceiling; status is always unknown.
    pub fn counted(name: &str, window: WindowKind, unit: &str, used: f64) -> Self {
        Self {
            used: Some(used),
            ..Self::base(name, window, unit, LimitStatus::Unknown)
        }
    }

    /// A consumption figure compared against an optional ceiling.
    pub fn against_used(
        name: &str,
        window: WindowKind,
        unit: &str,
        limit: Option<f64>,
        used: Option<f64>,
    ) -> Self {
        let status = super::status::metric_status_used(limit, used);
        Self {
            limit,
            used,
            remaining: match (limit, used) {
                (Some(l), Some(u)) => Some(l - u),
                _ => None,
            },
            ..Self::base(name, window, unit, status)
        }
    }

    /// A remaining-capacity figure compared against an optional ceiling.
    pub fn against_remaining(
        name: &str,
        window: WindowKind,
        unit: &str,
        limit: Option<f64>,
        remaining: Option<f64>,
    ) -> Self {
        let status = super::status::metric_status_remaining(limit, remaining);
        Self {
            limit,
            remaining,
            used: match (limit, remaining) {
                (Some(l), Some(r)) => Some((l - r).max(0.0)),
                _ => None,
            },
            ..Self::base(name, window, unit, status)
        }
    }

    /// Synthetic metric standing in for a fetch that produced nothing.
    pub fn failure(message: &str) -> Self {
        Self {
            id: "error".to_string(),
            ..Self::base(message, WindowKind::Custom, "", LimitStatus::Error)
        }
    }

    pub fn with_reset(mut self, reset_at: Option<DateTime<Utc>>) -> Self {
        self.reset_at = reset_at;
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Fraction of the limit consumed, in [0, 1].
    pub fn utilization(&self) -> Option<f64> {
        let limit = self.limit.filter(|l| *l > 0.0)?;
        let ratio = match (self.used, self.remaining) {
            (Some(used), _) => used / limit,
            (None, Some(remaining)) => 1.0 - remaining / limit,
            (None, None) => return None,
        };
        Some(ratio.clamp(0.0, 1.0))
    }
}

/// Stable metric identifier, e.g. `rpm:requests:requests-min`.
pub fn metric_id(window: WindowKind, name: &str, unit: &str) -> String {
    format!("{}:{}:{}", window.slug(), slugify(name), slugify(unit))
}

fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Where a snapshot's data came from, plus diagnostic notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub summary: String,
    pub details: Vec<String>,
}

impl SourceInfo {
    pub fn new(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            details: Vec::new(),
        }
    }
}

/// Normalized result of refreshing one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub display_name: String,
    pub provider: Provider,
    pub kind: AccountKind,
    pub metrics: Vec<LimitMetric>,
    pub status: OverallStatus,
    pub updated_at: DateTime<Utc>,
    pub source: SourceInfo,
}

impl AccountSnapshot {
    /// Highest utilization among the metrics that define one.
    pub fn utilization(&self) -> Option<f64> {
        self.metrics
            .iter()
            .filter_map(LimitMetric::utilization)
            .fold(None, |acc: Option<f64>, r| Some(acc.map_or(r, |a| a.max(r))))
    }
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
