use super::test_support::{fixed_now, StubTransport};
use super::*;
use crate::account_usage::secrets::MapSecrets;
use crate::account_usage::types::{AccountKind, WindowKind};

fn account(provider: Provider, kind: AccountKind) -> AccountConfig {
    AccountConfig::new("work-org", "Work", provider, kind)
}

fn ctx<'a>(transport: &'a StubTransport, secrets: &'a MapSecrets) -> FetchContext<'a> {
    FetchContext {
        transport,
        secrets,
        now: fixed_now(),
    }
}

#[test]
fn test_select_precedence() {
    let sub = account(Provider::Anthropic, AccountKind::Subscription);
    assert_eq!(Adapter::select(&sub), Adapter::NotAvailable(Provider::Anthropic));

    let demo_sub = sub.clone().with_setting("demo", "true");
    assert_eq!(Adapter::select(&demo_sub), Adapter::Demo(Provider::Anthropic));

    assert_eq!(
        Adapter::select(&account(Provider::OpenAi, AccountKind::Api)),
        Adapter::OpenAi
    );
    assert_eq!(
        Adapter::select(&account(Provider::Google, AccountKind::Api)),
        Adapter::Google
    );
}

#[test]
fn test_subscription_is_not_available_without_network() {
    let transport = StubTransport::new();
    let secrets = MapSecrets::new();
    let snapshot = fetch_account(
        &account(Provider::OpenAi, AccountKind::Subscription),
        &ctx(&transport, &secrets),
    );
    assert_eq!(snapshot.status, LimitStatus::Unknown);
    assert!(snapshot.metrics.is_empty());
    assert_eq!(snapshot.source.summary, "Usage not available");
    assert!(transport.requests().is_empty());
}

#[test]
fn test_missing_secret_names_scoped_key() {
    let transport = StubTransport::new();
    let secrets = MapSecrets::new();
    let snapshot = fetch_account(
        &account(Provider::OpenAi, AccountKind::Api),
        &ctx(&transport, &secrets),
    );
    assert_eq!(snapshot.status, LimitStatus::Error);
    assert_eq!(snapshot.metrics.len(), 1);
    assert_eq!(snapshot.metrics[0].status, LimitStatus::Error);
    assert_eq!(
        snapshot.source.summary,
        "Missing secret OPENAI_ADMIN_KEY_WORK_ORG"
    );
    assert!(transport.requests().is_empty());
}

#[test]
fn test_demo_overrides_provider() {
    let transport = StubTransport::new();
    let secrets = MapSecrets::new();
    let demo = account(Provider::Google, AccountKind::Api).with_setting("demo", "1");
    let snapshot = fetch_account(&demo, &ctx(&transport, &secrets));
    assert_eq!(snapshot.source.summary, "Demo data");
    assert_eq!(snapshot.provider, Provider::Google);
    assert!(transport.requests().is_empty());
}

#[test]
fn test_partial_fetch_total_failure_adds_synthetic_metric() {
    let acct = account(Provider::Anthropic, AccountKind::Api);
    let mut partial = PartialFetch::new();
    partial.record_failure(&acct, "Usage report", &UsageError::http_status(401, "nope"));
    partial.record_failure(&acct, "Cost report", &UsageError::Transport("down".into()));
    let snapshot = partial.finish(&acct, "Anthropic Admin API", fixed_now());

    assert_eq!(snapshot.status, LimitStatus::Error);
    assert_eq!(snapshot.metrics.len(), 1);
    assert_eq!(snapshot.metrics[0].id, "error");
    assert_eq!(
        snapshot.source.details,
        vec![
            "Usage report endpoint failed: HTTP 401: nope (check the API key)".to_string(),
            "Cost report endpoint failed: network error: down".to_string(),
        ]
    );
}

#[test]
fn test_partial_fetch_escalates_ok_to_warning() {
    let acct = account(Provider::OpenAi, AccountKind::Api);
    let mut partial = PartialFetch::new();
    partial.metrics.push(LimitMetric::against_remaining(
        "Requests",
        WindowKind::RequestsPerMinute,
        "requests/min",
        Some(100.0),
        Some(90.0),
    ));
    partial.record_failure(&acct, "Costs", &UsageError::http_status(500, "boom"));
    let snapshot = partial.finish(&acct, "test", fixed_now());
    assert_eq!(snapshot.status, LimitStatus::Warning);
}

#[test]
fn test_clean_fetch_with_only_counts_is_unknown() {
    let acct = account(Provider::OpenAi, AccountKind::Api);
    let mut partial = PartialFetch::new();
    partial.metrics.push(LimitMetric::counted(
        "Requests (24h)",
        WindowKind::Daily,
        "requests",
        3.0,
    ));
    let snapshot = partial.finish(&acct, "test", fixed_now());
    assert_eq!(snapshot.status, LimitStatus::Unknown);
    assert!(snapshot.source.details.is_empty());
}

#[test]
fn test_budget_prefers_daily_budget() {
    let acct = account(Provider::Anthropic, AccountKind::Api)
        .with_setting("budgetUSD", "50")
        .with_setting("dailyBudgetUSD", "$20");
    assert_eq!(budget_usd(&acct), Some(20.0));

    let fallback = account(Provider::Anthropic, AccountKind::Api).with_setting("budgetUSD", "50");
    assert_eq!(budget_usd(&fallback), Some(50.0));
    assert_eq!(budget_usd(&account(Provider::Anthropic, AccountKind::Api)), None);
}
