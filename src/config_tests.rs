use super::*;
use crate::account_usage::types::{AccountKind, Provider};
use tempfile::TempDir;

const TWO_ACCOUNTS: &str = r#"
refresh_interval_secs: 120
display:
  aggregation: average
accounts:
  - id: work
    name: Work OpenAI
    provider: openai
    settings:
      dailyBudgetUSD: 25
  - id: old
    name: Old Anthropic
    provider: anthropic
    kind: subscription
    enabled: false
"#;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_filters_disabled_accounts() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::load(&write_config(&dir, TWO_ACCOUNTS)).unwrap();

    assert_eq!(config.accounts.len(), 2);
    let enabled = config.enabled_accounts();
    assert_eq!(enabled.len(), 1);
    assert_eq!(enabled[0].id, "work");
    assert_eq!(enabled[0].provider, Provider::OpenAi);
    assert_eq!(enabled[0].setting("dailyBudgetUSD"), Some("25"));
    assert_eq!(config.accounts[1].kind, AccountKind::Subscription);
    assert_eq!(config.refresh_interval_secs, 120);
    assert_eq!(config.display.aggregation, AggregationMode::Average);
    assert!(config.display.show_details);
}

#[test]
fn test_missing_file_is_empty_config() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::load(&dir.path().join("nope.yaml")).unwrap();
    assert!(config.accounts.is_empty());
    assert_eq!(config.refresh_interval_secs, DEFAULT_REFRESH_INTERVAL_SECS);

    let state = ConfigState::load(&dir.path().join("nope.yaml"));
    assert!(state.accounts.is_empty());
    assert_eq!(state.error, None);
}

#[test]
fn test_json_config_is_accepted() {
    let json = r#"{"accounts": [{"id": "g", "name": "Gem", "provider": "google",
        "settings": {"demo": true, "projectId": "p-1"}}]}"#;
    let config = AppConfig::parse(json).unwrap();
    assert_eq!(config.accounts[0].provider, Provider::Google);
    assert!(config.accounts[0].is_demo());
    assert_eq!(config.accounts[0].setting("projectId"), Some("p-1"));
}

#[test]
fn test_duplicate_ids_rejected() {
    let yaml = r#"
accounts:
  - {id: a, name: One, provider: openai}
  - {id: a, name: Two, provider: google}
"#;
    let err = AppConfig::parse(yaml).unwrap_err();
    assert!(format!("{:#}", err).contains("duplicate account id 'a'"));
}

#[test]
fn test_short_interval_rejected() {
    assert!(AppConfig::parse("refresh_interval_secs: 1").is_err());
}

#[test]
fn test_unparseable_file_sets_global_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "accounts: [{id: x, provider: nokia}]");
    let state = ConfigState::load(&path);
    assert!(state.accounts.is_empty());
    let error = state.error.unwrap();
    assert!(error.contains("config.yaml"), "{}", error);
}

#[test]
fn test_null_settings_dropped() {
    let yaml = "accounts:\n  - id: a\n    name: A\n    provider: openai\n    settings:\n      tag: ~\n      icon: bolt\n";
    let config = AppConfig::parse(yaml).unwrap();
    let settings = &config.accounts[0].settings;
    assert_eq!(settings.len(), 1);
    assert_eq!(settings.get("icon").map(String::as_str), Some("bolt"));
}
