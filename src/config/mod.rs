// src/config/mod.rs
//! Process configuration read from the environment (and `.env` through
//! dotenvy in the binaries). Values are read once and handed to constructors;
//! nothing below reads the environment on the hot path.

pub mod ai;

use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::ingest::providers::gnews::DEFAULT_GNEWS_BASE_URL;
use crate::ingest::select::DEFAULT_MAX_RESULTS;

pub const ENV_GNEWS_API_KEY: &str = "GNEWS_API_KEY";
pub const ENV_GNEWS_BASE_URL: &str = "GNEWS_BASE_URL";
pub const ENV_MAX_RESULTS: &str = "NEWS_MAX_RESULTS";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "NEWS_FETCH_TIMEOUT_SECS";
pub const ENV_MAX_CONCURRENCY: &str = "NEWS_MAX_CONCURRENCY";
pub const ENV_FALLBACK_WINDOW_DAYS: &str = "NEWS_FALLBACK_WINDOW_DAYS";
pub const ENV_USER_AGENT: &str = "NEWS_USER_AGENT";

/// Upper bound for the fallback search window.
pub const MAX_FALLBACK_WINDOW_DAYS: i64 = 30;

const DEFAULT_USER_AGENT: &str = "research-assistant/0.1 (+https://github.com/lumlich/research-assistant)";

/// Settings of the news aggregation pass.
#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub max_results: usize,
    /// Per-source budget; a source that exceeds it counts as failed.
    pub fetch_timeout: Duration,
    pub max_concurrency: usize,
    pub fallback_window_days: i64,
    pub user_agent: String,
    pub gnews_api_key: Option<String>,
    pub gnews_base_url: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            fetch_timeout: Duration::from_secs(8),
            max_concurrency: 8,
            fallback_window_days: 7,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            gnews_api_key: None,
            gnews_base_url: DEFAULT_GNEWS_BASE_URL.to_string(),
        }
    }
}

impl NewsConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_results: env_parse(ENV_MAX_RESULTS, d.max_results),
            fetch_timeout: Duration::from_secs(
                env_parse(ENV_FETCH_TIMEOUT_SECS, d.fetch_timeout.as_secs()).clamp(1, 120),
            ),
            max_concurrency: env_parse(ENV_MAX_CONCURRENCY, d.max_concurrency).max(1),
            fallback_window_days: env_parse(ENV_FALLBACK_WINDOW_DAYS, d.fallback_window_days)
                .clamp(1, MAX_FALLBACK_WINDOW_DAYS),
            user_agent: env_string(ENV_USER_AGENT).unwrap_or(d.user_agent),
            gnews_api_key: env_string(ENV_GNEWS_API_KEY),
            gnews_base_url: env_string(ENV_GNEWS_BASE_URL).unwrap_or(d.gnews_base_url),
        }
    }
}

/// Non-empty, trimmed env value.
pub fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an env value, keeping `default` (with a warning) when it is not valid.
pub fn env_parse<T>(name: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Debug,
{
    match env_string(name) {
        None => default,
        Some(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            warn!(var = name, value = %raw, ?default, "invalid value, using default");
            default
        }),
    }
}
