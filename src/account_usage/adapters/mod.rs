//! Provider adapters: one account in, one normalized snapshot out.
//!
//! Adapters are total. Every failure, from a missing key to a malformed
//! payload, ends up in the returned snapshot's status and source details.

pub mod anthropic;
pub mod demo;
pub mod google;
pub mod openai;

use super::error::{UsageError, UsageResult};
use super::secrets::{self, SecretName, SecretSource};
use super::status::overall_status;
use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use super::types::{
    AccountConfig, AccountSnapshot, LimitMetric, LimitStatus, Provider, SourceInfo,
};
use chrono::{DateTime, Utc};

/// Length of the trailing usage window queried by the report endpoints.
pub const USAGE_WINDOW_SECS: i64 = 86_400;

/// Everything an adapter needs besides the account itself.
#[derive(Clone, Copy)]
pub struct FetchContext<'a> {
    pub transport: &'a dyn HttpTransport,
    pub secrets: &'a dyn SecretSource,
    pub now: DateTime<Utc>,
}

impl FetchContext<'_> {
    pub fn window_start(&self) -> DateTime<Utc> {
        self.now - chrono::Duration::seconds(USAGE_WINDOW_SECS)
    }

    /// Issues one request and decodes a 2xx body as JSON.
    pub fn get_json(&self, request: &HttpRequest) -> UsageResult<serde_json::Value> {
        self.transport.get(request)?.into_json()
    }

    /// Issues one request and returns the raw response if it was 2xx.
    pub fn get_ok(&self, request: &HttpRequest) -> UsageResult<HttpResponse> {
        let response = self.transport.get(request)?;
        if !response.is_success() {
            return Err(UsageError::http_status(response.status, &response.body));
        }
        Ok(response)
    }
}

/// The closed set of fetch strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adapter {
    OpenAi,
    Anthropic,
    Google,
    /// Generated data under any provider's identity.
    Demo(Provider),
    /// Subscription accounts whose provider exposes no usage endpoint.
    NotAvailable(Provider),
}

impl Adapter {
    /// Picks the adapter: demo flag, then unsupported subscription, then provider.
    pub fn select(account: &AccountConfig) -> Self {
        if account.is_demo() {
            return Adapter::Demo(account.provider);
        }
        if is_unsupported_subscription(account) {
            return Adapter::NotAvailable(account.provider);
        }
        match account.provider {
            Provider::OpenAi => Adapter::OpenAi,
            Provider::Anthropic => Adapter::Anthropic,
            Provider::Google => Adapter::Google,
        }
    }

    pub fn fetch(self, account: &AccountConfig, ctx: &FetchContext<'_>) -> AccountSnapshot {
        match self {
            Adapter::OpenAi => openai::fetch(account, ctx),
            Adapter::Anthropic => anthropic::fetch(account, ctx),
            Adapter::Google => google::fetch(account, ctx),
            Adapter::Demo(provider) => demo::fetch(account, provider, ctx.now),
            Adapter::NotAvailable(_) => not_available_snapshot(account, ctx.now),
        }
    }
}

/// Selects and runs the adapter for `account`.
pub fn fetch_account(account: &AccountConfig, ctx: &FetchContext<'_>) -> AccountSnapshot {
    let adapter = Adapter::select(account);
    tracing::debug!(account = %account.id, ?adapter, "fetching account");
    adapter.fetch(account, ctx)
}

pub(crate) fn is_unsupported_subscription(account: &AccountConfig) -> bool {
    account.kind == super::types::AccountKind::Subscription
        && !account.provider.supports_subscription_usage()
}

fn snapshot(
    account: &AccountConfig,
    metrics: Vec<LimitMetric>,
    status: LimitStatus,
    now: DateTime<Utc>,
    source: SourceInfo,
) -> AccountSnapshot {
    AccountSnapshot {
        account_id: account.id.clone(),
        display_name: account.name.clone(),
        provider: account.provider,
        kind: account.kind,
        metrics,
        status,
        updated_at: now,
        source,
    }
}

/// Snapshot for subscription accounts with no usage API. Not a failure.
pub fn not_available_snapshot(account: &AccountConfig, now: DateTime<Utc>) -> AccountSnapshot {
    let mut source = SourceInfo::new("Usage not available");
    let reason = UsageError::Unsupported(format!(
        "{} does not expose usage for subscription accounts through a public API",
        account.provider.display_name()
    ));
    source.details.push(capitalize(&reason.to_string()));
    snapshot(account, Vec::new(), LimitStatus::Unknown, now, source)
}

/// Snapshot for an account whose fetch could not be attempted or completed.
pub fn error_snapshot(account: &AccountConfig, message: &str, now: DateTime<Utc>) -> AccountSnapshot {
    let mut source = SourceInfo::new(message);
    source.details.push(message.to_string());
    snapshot(
        account,
        vec![LimitMetric::failure(message)],
        LimitStatus::Error,
        now,
        source,
    )
}

/// Resolves a required secret or produces the error snapshot naming it.
pub(crate) fn require_secret(
    account: &AccountConfig,
    ctx: &FetchContext<'_>,
    name: &SecretName,
) -> Result<String, AccountSnapshot> {
    match secrets::resolve(ctx.secrets, account, name) {
        Some(value) => Ok(value),
        None => {
            let expected = name.scoped(account);
            tracing::warn!(account = %account.id, secret = %expected, "missing secret");
            let err = UsageError::MissingSecret(expected);
            Err(error_snapshot(account, &capitalize(&err.to_string()), ctx.now))
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Collects metrics and failures from independent sub-fetches.
#[derive(Debug, Default)]
pub(crate) struct PartialFetch {
    pub metrics: Vec<LimitMetric>,
    pub details: Vec<String>,
    pub failures: usize,
}

impl PartialFetch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed sub-fetch as `"<label> endpoint failed: <error>"`.
    pub fn record_failure(&mut self, account: &AccountConfig, label: &str, err: &UsageError) {
        tracing::warn!(account = %account.id, endpoint = label, error = %err, "sub-fetch failed");
        let mut line = format!("{} endpoint failed: {}", label, err);
        if err.is_auth_failure() {
            line.push_str(" (check the API key)");
        }
        self.details.push(line);
        self.failures += 1;
    }

    /// Builds the snapshot and derives its overall status.
    ///
    /// Any failed sub-fetch turns the fallback into `Error` and lifts a
    /// milder metric-derived status (`Ok` or `Unknown`) to `Warning`.
    pub fn finish(
        mut self,
        account: &AccountConfig,
        summary: &str,
        now: DateTime<Utc>,
    ) -> AccountSnapshot {
        let partial = self.failures > 0;
        if partial && self.metrics.is_empty() {
            self.metrics.push(LimitMetric::failure("Fetch failed"));
        }
        let fallback = if partial {
            LimitStatus::Error
        } else {
            LimitStatus::Unknown
        };
        let mut status = overall_status(&self.metrics, fallback);
        if partial && status < LimitStatus::Warning {
            status = LimitStatus::Warning;
        }
        let source = SourceInfo {
            summary: summary.to_string(),
            details: self.details,
        };
        snapshot(account, self.metrics, status, now, source)
    }
}

/// Budget from `dailyBudgetUSD`, then `budgetUSD`.
pub(crate) fn budget_usd(account: &AccountConfig) -> Option<f64> {
    ["dailyBudgetUSD", "budgetUSD"]
        .iter()
        .find_map(|key| account.setting(key))
        .and_then(super::extract::parse_decimal_setting)
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "../tests/adapters_tests.rs"]
mod tests;
