//! Refresh coordinator: runs one adapter per account and orders the results.

use super::adapters::{error_snapshot, fetch_account, FetchContext};
use super::secrets::{EnvSecrets, SecretSource};
use super::transport::{HttpTransport, UreqTransport};
use super::types::{AccountConfig, AccountSnapshot};
use chrono::Utc;
use std::sync::Arc;

/// Shared collaborators for a refresh.
#[derive(Clone)]
pub struct FetchEnv {
    pub transport: Arc<dyn HttpTransport>,
    pub secrets: Arc<dyn SecretSource>,
}

impl FetchEnv {
    pub fn new(transport: Arc<dyn HttpTransport>, secrets: Arc<dyn SecretSource>) -> Self {
        Self { transport, secrets }
    }

    /// Real HTTP with secrets from the process environment.
    pub fn production() -> Self {
        Self::new(Arc::new(UreqTransport::new()), Arc::new(EnvSecrets))
    }

    fn fetch_one(&self, account: &AccountConfig) -> AccountSnapshot {
        let ctx = FetchContext {
            transport: self.transport.as_ref(),
            secrets: self.secrets.as_ref(),
            now: Utc::now(),
        };
        fetch_account(account, &ctx)
    }
}

/// Fetches every account concurrently on the blocking pool and returns the
/// snapshots in display order.
///
/// A fetch that panics yields an error snapshot for that account only.
pub async fn refresh(accounts: &[AccountConfig], env: &FetchEnv) -> Vec<AccountSnapshot> {
    let tasks = accounts.iter().cloned().map(|account| {
        let env = env.clone();
        async move {
            let task_account = account.clone();
            match tokio::task::spawn_blocking(move || env.fetch_one(&task_account)).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::error!(account = %account.id, error = %e, "fetch task failed");
                    error_snapshot(&account, &format!("Fetch task failed: {}", e), Utc::now())
                }
            }
        }
    });

    let mut snapshots = futures::future::join_all(tasks).await;
    sort_snapshots(&mut snapshots);
    log_summary(&snapshots);
    snapshots
}

/// Same pipeline as [`refresh`], one account at a time on the calling thread.
pub fn refresh_blocking(accounts: &[AccountConfig], env: &FetchEnv) -> Vec<AccountSnapshot> {
    let mut snapshots: Vec<AccountSnapshot> = accounts.iter().map(|a| env.fetch_one(a)).collect();
    sort_snapshots(&mut snapshots);
    log_summary(&snapshots);
    snapshots
}

/// Orders by provider, then display name ignoring case, then account id.
pub fn sort_snapshots(snapshots: &mut [AccountSnapshot]) {
    snapshots.sort_by(|a, b| {
        a.provider
            .ordinal()
            .cmp(&b.provider.ordinal())
            .then_with(|| {
                a.display_name
                    .to_lowercase()
                    .cmp(&b.display_name.to_lowercase())
            })
            .then_with(|| a.account_id.cmp(&b.account_id))
    });
}

fn log_summary(snapshots: &[AccountSnapshot]) {
    let alerting = super::status::warning_count(snapshots);
    tracing::info!(
        accounts = snapshots.len(),
        alerting,
        status = %super::status::overall_app_status(snapshots),
        "refresh complete"
    );
}

#[cfg(test)]
#[path = "tests/fetcher_tests.rs"]
mod tests;
