//! Home-based storage paths: `~/.limitwatch/`.
//!
//! `LIMITWATCH_HOME` replaces `~/.limitwatch` entirely; `LIMITWATCH_CONFIG`
//! points at a config file directly.

use anyhow::{Context, Result};
use std::path::PathBuf;

const LIMITWATCH_DIR: &str = ".limitwatch";
const CONFIG_FILE: &str = "config.yaml";

pub const HOME_ENV: &str = "LIMITWATCH_HOME";
pub const CONFIG_ENV: &str = "LIMITWATCH_CONFIG";

/// Returns `~/.limitwatch/` (or `$LIMITWATCH_HOME`). Not created here.
pub fn limitwatch_home_dir() -> Result<PathBuf> {
    if let Some(home) = non_empty_env(HOME_ENV) {
        return Ok(PathBuf::from(home));
    }
    let home = dirs::home_dir().context("Could not determine home directory for config")?;
    Ok(home.join(LIMITWATCH_DIR))
}

/// Returns `~/.limitwatch/config.yaml`.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(limitwatch_home_dir()?.join(CONFIG_FILE))
}

/// Config path from, in order: the CLI flag, `$LIMITWATCH_CONFIG`, the default.
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_path {
        return Ok(path);
    }
    if let Some(path) = non_empty_env(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    default_config_path()
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn test_home_override() {
        let dir = tempdir().unwrap();
        std::env::set_var(HOME_ENV, dir.path());
        std::env::remove_var(CONFIG_ENV);
        let path = default_config_path().unwrap();
        let resolved = resolve_config_path(None).unwrap();
        std::env::remove_var(HOME_ENV);

        assert_eq!(path, dir.path().join("config.yaml"));
        assert_eq!(resolved, path);
    }

    #[test]
    #[serial]
    fn test_resolution_order() {
        std::env::set_var(CONFIG_ENV, "/tmp/from-env.yaml");
        let from_env = resolve_config_path(None).unwrap();
        let from_cli = resolve_config_path(Some(PathBuf::from("/tmp/cli.yaml"))).unwrap();
        std::env::remove_var(CONFIG_ENV);

        assert_eq!(from_env, PathBuf::from("/tmp/from-env.yaml"));
        assert_eq!(from_cli, PathBuf::from("/tmp/cli.yaml"));
    }

    #[test]
    #[serial]
    fn test_blank_env_is_ignored() {
        std::env::set_var(CONFIG_ENV, "  ");
        std::env::remove_var(HOME_ENV);
        let resolved = resolve_config_path(None);
        std::env::remove_var(CONFIG_ENV);

        if let Ok(path) = resolved {
            assert!(path.ends_with(".limitwatch/config.yaml"));
        }
    }
}
