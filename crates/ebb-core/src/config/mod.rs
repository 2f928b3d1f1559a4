//! Client sync settings.
//!
//! Resolved from environment variables through a lookup function so callers
//! (and tests) can supply values from anywhere.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::remote::normalize_base_url;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_SYNC_DELAY_MS: u64 = 1_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 4_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Knobs for the remote client and the reconnect trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Base URL of the remote todo API, without a trailing slash
    pub api_base_url: String,
    /// Debounce between an offline→online transition and the drain it triggers
    pub sync_delay: Duration,
    /// How often the connectivity poller probes the remote store
    pub poll_interval: Duration,
    /// Per-request timeout for remote calls
    pub request_timeout: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            sync_delay: Duration::from_millis(DEFAULT_SYNC_DELAY_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

impl SyncSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = optional_trimmed(&lookup, "EBB_API_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = normalize_base_url(&api_base_url).map_err(|_| {
            ConfigError::Invalid("EBB_API_URL must start with http:// or https://".to_string())
        })?;

        let sync_delay = millis(&lookup, "EBB_SYNC_DELAY_MS", DEFAULT_SYNC_DELAY_MS, 0..=60_000)?;
        let poll_interval = millis(
            &lookup,
            "EBB_POLL_INTERVAL_MS",
            DEFAULT_POLL_INTERVAL_MS,
            250..=600_000,
        )?;
        let request_timeout = millis(
            &lookup,
            "EBB_REQUEST_TIMEOUT_MS",
            DEFAULT_REQUEST_TIMEOUT_MS,
            100..=60_000,
        )?;

        Ok(Self {
            api_base_url,
            sync_delay,
            poll_interval,
            request_timeout,
        })
    }

    /// Replace the API base URL, validating it the same way the env var is.
    pub fn with_api_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_base_url = normalize_base_url(raw).map_err(|_| {
            ConfigError::Invalid("API URL must start with http:// or https://".to_string())
        })?;
        Ok(self)
    }
}

fn millis(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
    range: std::ops::RangeInclusive<u64>,
) -> Result<Duration, ConfigError> {
    let Some(raw) = optional_trimmed(lookup, name) else {
        return Ok(Duration::from_millis(default));
    };
    let value = raw.parse::<u64>().map_err(|_| {
        ConfigError::Invalid(format!(
            "{name} must be an integer in [{}, {}]",
            range.start(),
            range.end()
        ))
    })?;
    if !range.contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{name} must be in [{}, {}]",
            range.start(),
            range.end()
        )));
    }
    Ok(Duration::from_millis(value))
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
