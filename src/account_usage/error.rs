//! Error taxonomy for usage fetching.
//!
//! Every variant is caught at the adapter sub-fetch boundary and turned into a
//! detail line on the account's snapshot; none of them escape a refresh.

use thiserror::Error;

/// Longest response body kept in an error message.
const MAX_BODY_CHARS: usize = 300;

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("missing secret {0}")]
    MissingSecret(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("HTTP {code}: {body}")]
    HttpStatus { code: u16, body: String },

    #[error("parse error: {0}")]
    Parsing(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("network error: {0}")]
    Transport(String),
}

impl UsageError {
    /// Builds an HTTP status error, truncating long bodies.
    pub fn http_status(code: u16, body: &str) -> Self {
        let body = body.trim();
        let body = match body.char_indices().nth(MAX_BODY_CHARS) {
            Some((idx, _)) => format!("{}…", body.get(..idx).unwrap_or(body)),
            None => body.to_string(),
        };
        UsageError::HttpStatus { code, body }
    }

    /// True for 401/403 responses, which usually mean a bad or expired key.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, UsageError::HttpStatus { code: 401 | 403, .. })
    }
}

impl From<serde_json::Error> for UsageError {
    fn from(e: serde_json::Error) -> Self {
        UsageError::Parsing(e.to_string())
    }
}

pub type UsageResult<T> = Result<T, UsageError>;
