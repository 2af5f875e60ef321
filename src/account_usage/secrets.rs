//! Secret resolution for provider credentials.
//!
//! Secrets never live in the config file. Each account looks them up by name
//! in a [`SecretSource`] (the process environment in production), trying the
//! account-scoped name first:
//!
//! 1. `<BASE>_<ACCOUNT_SUFFIX>` (e.g. `OPENAI_ADMIN_KEY_WORK_ORG` for `work-org`)
//! 2. `<BASE>`
//! 3. legacy names, in order
//!
//! The first non-empty value wins.

use super::types::AccountConfig;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

pub const OPENAI_KEY: SecretName = SecretName {
    base: "OPENAI_ADMIN_KEY",
    legacy: &["OPENAI_API_KEY"],
};

pub const ANTHROPIC_KEY: SecretName = SecretName {
    base: "ANTHROPIC_ADMIN_KEY",
    legacy: &["ANTHROPIC_API_KEY"],
};

pub const GOOGLE_TOKEN: SecretName = SecretName {
    base: "GOOGLE_OAUTH_ACCESS_TOKEN",
    legacy: &["GOOGLE_ACCESS_TOKEN", "GEMINI_ACCESS_TOKEN"],
};

pub const GOOGLE_PROJECT: SecretName = SecretName {
    base: "GOOGLE_CLOUD_PROJECT",
    legacy: &["GCLOUD_PROJECT", "GOOGLE_PROJECT_ID"],
};

/// A named secret with its fallback names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretName {
    pub base: &'static str,
    pub legacy: &'static [&'static str],
}

impl SecretName {
    /// The account-scoped name, reported when nothing was found.
    pub fn scoped(&self, account: &AccountConfig) -> String {
        format!("{}_{}", self.base, account_suffix(&account.id))
    }

    /// All candidate names in lookup order.
    pub fn candidates(&self, account: &AccountConfig) -> Vec<String> {
        let mut names = vec![self.scoped(account), self.base.to_string()];
        names.extend(self.legacy.iter().map(|s| s.to_string()));
        names
    }
}

/// Where secret values come from.
pub trait SecretSource: Send + Sync {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Reads secrets from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecrets;

impl SecretSource for EnvSecrets {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed in-memory secrets.
#[derive(Debug, Clone, Default)]
pub struct MapSecrets {
    values: HashMap<String, String>,
}

impl MapSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_string(), value.to_string());
        self
    }
}

impl SecretSource for MapSecrets {
    fn lookup(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

fn non_alnum_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Z0-9]+").ok()).as_ref()
}

/// Account id uppercased with every run of non-alphanumerics turned into `_`.
pub fn account_suffix(account_id: &str) -> String {
    let upper = account_id.to_ascii_uppercase();
    match non_alnum_re() {
        Some(re) => re.replace_all(&upper, "_").into_owned(),
        None => upper,
    }
}

/// Resolves `name` for `account`; `None` when every candidate is unset or blank.
pub fn resolve(
    source: &dyn SecretSource,
    account: &AccountConfig,
    name: &SecretName,
) -> Option<String> {
    name.candidates(account).iter().find_map(|candidate| {
        source
            .lookup(candidate)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}
