//! Provider usage and limit polling.
//!
//! Accounts are configured in [`crate::config`], fetched by one adapter each
//! and normalized into [`types::AccountSnapshot`]s:
//! - [`adapters`] talk to OpenAI, Anthropic and Google (or generate demo data)
//! - [`fetcher`] runs every account concurrently and orders the results
//! - [`status`] reduces metrics to account and app-wide severity

pub mod adapters;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod secrets;
pub mod status;
pub mod transport;
pub mod types;

pub use error::{UsageError, UsageResult};
pub use fetcher::{refresh, refresh_blocking, FetchEnv};
pub use types::{AccountConfig, AccountSnapshot, LimitMetric, LimitStatus, Provider};
