//! Periodic refresh with a single-flight guard.
//!
//! Each refresh reloads the config, fetches every enabled account and
//! publishes a [`RefreshView`] on a watch channel. A refresh requested while
//! another is running is dropped, not queued.

use crate::account_usage::fetcher::{refresh, FetchEnv};
use crate::account_usage::status::{
    aggregate_utilization_percent, overall_app_status, warning_count,
};
use crate::account_usage::types::{AccountSnapshot, OverallStatus};
use crate::config::{ConfigState, DisplayConfig, DEFAULT_REFRESH_INTERVAL_SECS};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Result of the latest completed refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshView {
    pub snapshots: Vec<AccountSnapshot>,
    /// Set when the config could not be loaded; `snapshots` is then empty.
    pub config_error: Option<String>,
    pub display: DisplayConfig,
    pub refresh_interval_secs: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Default for RefreshView {
    fn default() -> Self {
        Self {
            snapshots: Vec::new(),
            config_error: None,
            display: DisplayConfig::default(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            refreshed_at: None,
        }
    }
}

impl RefreshView {
    pub fn app_status(&self) -> OverallStatus {
        overall_app_status(&self.snapshots)
    }

    pub fn warning_count(&self) -> usize {
        warning_count(&self.snapshots)
    }

    pub fn utilization_percent(&self) -> Option<u8> {
        aggregate_utilization_percent(&self.snapshots, self.display.aggregation)
    }
}

/// Clears the in-flight flag however the refresh future ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct RefreshScheduler {
    config_path: PathBuf,
    env: FetchEnv,
    in_flight: AtomicBool,
    view_tx: watch::Sender<RefreshView>,
}

impl RefreshScheduler {
    pub fn new(config_path: PathBuf, env: FetchEnv) -> Self {
        let (view_tx, _) = watch::channel(RefreshView::default());
        Self {
            config_path,
            env,
            in_flight: AtomicBool::new(false),
            view_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RefreshView> {
        self.view_tx.subscribe()
    }

    /// The latest published view.
    pub fn view(&self) -> RefreshView {
        self.view_tx.borrow().clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Runs one refresh unless one is already in flight (then `None`).
    pub async fn try_refresh(&self) -> Option<RefreshView> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!("refresh already in flight, skipping");
            return None;
        };

        let config = ConfigState::load(&self.config_path);
        let snapshots = if config.error.is_some() {
            Vec::new()
        } else {
            refresh(&config.accounts, &self.env).await
        };

        let view = RefreshView {
            snapshots,
            config_error: config.error,
            display: config.display,
            refresh_interval_secs: config.refresh_interval_secs,
            refreshed_at: Some(Utc::now()),
        };
        self.view_tx.send_replace(view.clone());
        Some(view)
    }

    /// Refreshes on every tick of `interval`, starting immediately, until
    /// `shutdown` turns true or its sender goes away. A refresh in flight at
    /// shutdown is abandoned without publishing.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = interval.as_secs(), "refresh loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = self.try_refresh() => {}
                        _ = stop_requested(&mut shutdown) => break,
                    }
                }
                _ = stop_requested(&mut shutdown) => break,
            }
        }
        tracing::info!("refresh loop shutting down");
    }
}

/// Resolves once `shutdown` is true or its sender is dropped.
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    // wait_for also sees a stop sent before this call.
    let _ = shutdown.wait_for(|stop| *stop).await;
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
