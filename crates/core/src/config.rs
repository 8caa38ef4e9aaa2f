// crates/core/src/config.rs

//! Runtime configuration, built once at startup and passed by reference to
//! every component. No ambient global state.

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono_tz::Tz;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Operating timezone for every resolved instant.
    pub timezone: Tz,
    /// Iteration ceiling for one orchestration run.
    pub max_iterations: usize,
    /// Default cap on search results when the caller does not pass one.
    pub max_search_results: usize,
    /// Default event length when a create call has no end time.
    pub default_event_minutes: i64,
    /// Recency window (from the start of the current month) used to resolve
    /// human-readable event identifiers.
    pub search_window_days: i64,
    /// Transport retries before a run fails with an API error.
    pub retry_attempts: u32,
    /// Base of the linear backoff between transport retries.
    pub retry_backoff_secs: u64,
    /// Per-request timeout on the model and calendar HTTP calls.
    pub request_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            max_iterations: 8,
            max_search_results: 10,
            default_event_minutes: 60,
            search_window_days: 31,
            retry_attempts: 3,
            retry_backoff_secs: 2,
            request_timeout_secs: 60,
        }
    }
}

impl AgentConfig {
    /// Build the configuration from the environment.
    ///
    /// Variables (all optional):
    /// - CALCHAT_TIMEZONE: IANA zone name, e.g. "Europe/Amsterdam"
    /// - CALCHAT_MAX_ITERATIONS
    /// - CALCHAT_MAX_SEARCH_RESULTS
    /// - CALCHAT_DEFAULT_EVENT_MINUTES
    /// - CALCHAT_SEARCH_WINDOW_DAYS
    /// - CALCHAT_RETRY_ATTEMPTS
    /// - CALCHAT_RETRY_BACKOFF_SECS
    /// - CALCHAT_REQUEST_TIMEOUT_SECS
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let timezone = match std::env::var("CALCHAT_TIMEZONE") {
            Ok(name) => Tz::from_str(&name)
                .ok()
                .with_context(|| format!("CALCHAT_TIMEZONE '{}' is not a known timezone", name))?,
            Err(_) => defaults.timezone,
        };

        Ok(Self {
            timezone,
            max_iterations: env_or("CALCHAT_MAX_ITERATIONS", defaults.max_iterations),
            max_search_results: env_or("CALCHAT_MAX_SEARCH_RESULTS", defaults.max_search_results),
            default_event_minutes: env_or(
                "CALCHAT_DEFAULT_EVENT_MINUTES",
                defaults.default_event_minutes,
            ),
            search_window_days: env_or("CALCHAT_SEARCH_WINDOW_DAYS", defaults.search_window_days),
            retry_attempts: env_or("CALCHAT_RETRY_ATTEMPTS", defaults.retry_attempts),
            retry_backoff_secs: env_or("CALCHAT_RETRY_BACKOFF_SECS", defaults.retry_backoff_secs),
            request_timeout_secs: env_or(
                "CALCHAT_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            ),
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AgentConfig::default();
        assert_eq!(config.timezone, chrono_tz::UTC);
        assert_eq!(config.max_iterations, 8);
        assert_eq!(config.max_search_results, 10);
        assert_eq!(config.default_event_minutes, 60);
    }
}
