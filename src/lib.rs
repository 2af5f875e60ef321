//! Polls AI provider usage and rate limits and reduces them to one status.

pub mod account_usage;
pub mod config;
pub mod display;
pub mod paths;
pub mod scheduler;
pub mod usage_reset;
