//! Application configuration: the account list and display preferences.
//!
//! Loaded from YAML (JSON parses too). Secrets never live here; see
//! [`crate::account_usage::secrets`].

use crate::account_usage::error::UsageError;
use crate::account_usage::status::AggregationMode;
use crate::account_usage::types::AccountConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Default seconds between background refreshes.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

/// Shortest refresh interval accepted from config.
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            display: DisplayConfig::default(),
            accounts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub aggregation: AggregationMode,
    /// Show per-metric lines under each account.
    #[serde(default = "default_true")]
    pub show_details: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            aggregation: AggregationMode::default(),
            show_details: true,
        }
    }
}

impl AppConfig {
    /// Loads and validates the config at `path`. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_yaml::from_str(content).context("Failed to parse config as YAML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.refresh_interval_secs < MIN_REFRESH_INTERVAL_SECS {
            return Err(UsageError::InvalidConfig(format!(
                "refresh_interval_secs must be at least {}, got {}",
                MIN_REFRESH_INTERVAL_SECS, self.refresh_interval_secs
            ))
            .into());
        }

        let mut seen = HashSet::new();
        for account in &self.accounts {
            if account.id.trim().is_empty() {
                return Err(UsageError::InvalidConfig(format!(
                    "account '{}' has an empty id",
                    account.name
                ))
                .into());
            }
            if !seen.insert(account.id.as_str()) {
                return Err(UsageError::InvalidConfig(format!(
                    "duplicate account id '{}'",
                    account.id
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Accounts with `enabled: true`, in file order.
    pub fn enabled_accounts(&self) -> Vec<AccountConfig> {
        self.accounts.iter().filter(|a| a.enabled).cloned().collect()
    }
}

/// The config as the app sees it after a load attempt.
///
/// A failed load is a global error, not an account error: the account list
/// is empty until a later load succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigState {
    pub accounts: Vec<AccountConfig>,
    pub display: DisplayConfig,
    pub refresh_interval_secs: u64,
    pub error: Option<String>,
}

impl ConfigState {
    pub fn load(path: &Path) -> Self {
        match AppConfig::load(path) {
            Ok(config) => Self {
                accounts: config.enabled_accounts(),
                display: config.display,
                refresh_interval_secs: config.refresh_interval_secs,
                error: None,
            },
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::warn!(error = %message, "config load failed");
                Self {
                    accounts: Vec::new(),
                    display: DisplayConfig::default(),
                    refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
                    error: Some(message),
                }
            }
        }
    }
}

/// Settings are strings, but YAML users write `budgetUSD: 25` or `demo: true`.
/// Scalars are kept as their text; nulls are dropped.
pub fn loose_string_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Bool(bool),
        Int(i64),
        Float(f64),
        Text(String),
    }

    let raw: BTreeMap<String, Option<Scalar>> = BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value? {
                Scalar::Bool(b) => b.to_string(),
                Scalar::Int(i) => i.to_string(),
                Scalar::Float(f) => f.to_string(),
                Scalar::Text(s) => s,
            };
            Some((key, text))
        })
        .collect())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
