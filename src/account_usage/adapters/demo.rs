//! Generated usage for demos and screenshots.
//!
//! Values are derived from the account id alone, so the same account always
//! renders the same numbers. Reset times move with `now`.

use super::budget_usd;
use crate::account_usage::status::overall_status;
use crate::account_usage::types::{
    AccountConfig, AccountKind, AccountSnapshot, LimitMetric, LimitStatus, Provider, SourceInfo,
    WindowKind,
};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

const DEFAULT_BUDGET_USD: f64 = 100.0;
const DEMO_RPM_LIMIT: f64 = 500.0;
const DEMO_TPM_LIMIT: f64 = 200_000.0;

/// Stable value in `0..100` for an account id.
pub fn demo_seed(account_id: &str) -> u64 {
    let digest = Sha256::digest(account_id.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head) % 100
}

pub fn fetch(account: &AccountConfig, provider: Provider, now: DateTime<Utc>) -> AccountSnapshot {
    let seed = demo_seed(&account.id);
    let metrics = match account.kind {
        AccountKind::Subscription => subscription_metrics(seed, now),
        AccountKind::Api => api_metrics(account, seed, now),
    };
    let status = overall_status(&metrics, LimitStatus::Unknown);

    let mut source = SourceInfo::new("Demo data");
    source
        .details
        .push("Generated locally; no provider was contacted.".to_string());

    AccountSnapshot {
        account_id: account.id.clone(),
        display_name: account.name.clone(),
        provider,
        kind: account.kind,
        metrics,
        status,
        updated_at: now,
        source,
    }
}

fn subscription_metrics(seed: u64, now: DateTime<Utc>) -> Vec<LimitMetric> {
    let session_used = seed as f64;
    let weekly_used = ((seed * 7 + 13) % 100) as f64;
    vec![
        LimitMetric::against_used(
            "Session",
            WindowKind::Session,
            "percent",
            Some(100.0),
            Some(session_used),
        )
        .with_reset(Some(now + Duration::minutes(300 - (seed as i64 * 3)))),
        LimitMetric::against_used(
            "Weekly",
            WindowKind::Weekly,
            "percent",
            Some(100.0),
            Some(weekly_used),
        )
        .with_reset(Some(now + Duration::hours(1 + (seed as i64 * 167) / 100))),
    ]
}

fn api_metrics(account: &AccountConfig, seed: u64, now: DateTime<Utc>) -> Vec<LimitMetric> {
    let budget = budget_usd(account).unwrap_or(DEFAULT_BUDGET_USD);
    let cost = (budget * seed as f64 / 100.0 * 100.0).round() / 100.0;
    let rpm_remaining = DEMO_RPM_LIMIT * ((seed + 41) % 100) as f64 / 100.0;
    let tpm_remaining = DEMO_TPM_LIMIT * ((seed + 67) % 100) as f64 / 100.0;
    let midnight_in = 86_400 - now.timestamp().rem_euclid(86_400);

    vec![
        LimitMetric::against_used("Cost (24h)", WindowKind::Daily, "usd", Some(budget), Some(cost))
            .with_reset(Some(now + Duration::seconds(midnight_in))),
        LimitMetric::against_remaining(
            "Requests",
            WindowKind::RequestsPerMinute,
            "requests/min",
            Some(DEMO_RPM_LIMIT),
            Some(rpm_remaining),
        )
        .with_reset(Some(now + Duration::seconds(1 + (seed as i64 % 60)))),
        LimitMetric::against_remaining(
            "Tokens",
            WindowKind::TokensPerMinute,
            "tokens/min",
            Some(DEMO_TPM_LIMIT),
            Some(tpm_remaining),
        )
        .with_reset(Some(now + Duration::seconds(1 + ((seed as i64 * 7) % 60)))),
    ]
}
