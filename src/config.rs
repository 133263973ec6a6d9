//! Endpoint configuration
//!
//! Two endpoints are supplied from outside: the REST base address and the
//! push channel address. Both have local-development defaults.
//!
//! ```bash
//! COPILOT_API_URL=http://localhost:8000/api/v1
//! COPILOT_WS_URL=ws://localhost:8000/ws
//! COPILOT_RECONNECT_MS=5000
//! COPILOT_REQUEST_TIMEOUT_SECS=10
//! ```

use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const API_URL_ENV: &str = "COPILOT_API_URL";
pub const WS_URL_ENV: &str = "COPILOT_WS_URL";
pub const RECONNECT_MS_ENV: &str = "COPILOT_RECONNECT_MS";
pub const REQUEST_TIMEOUT_ENV: &str = "COPILOT_REQUEST_TIMEOUT_SECS";

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws";
pub const DEFAULT_RECONNECT_MS: u64 = 5000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key}: invalid URL '{value}': {source}")]
    InvalidUrl {
        key: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{key}: unsupported scheme '{scheme}', expected {expected}")]
    UnsupportedScheme {
        key: &'static str,
        scheme: String,
        expected: &'static str,
    },

    #[error("{key}: expected a positive integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
}

/// Client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// REST base address, e.g. `http://localhost:8000/api/v1`
    pub api_url: Url,
    /// Push channel address, e.g. `ws://localhost:8000/ws`
    pub channel_url: Url,
    /// Fixed delay between a lost connection and the next attempt
    pub reconnect_interval: Duration,
    /// Per-request timeout for the REST accessor
    pub request_timeout: Duration,
}

impl Config {
    /// Load from the process environment, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = match value(API_URL_ENV) {
            Some(v) => parse_api_url(&v)?,
            None => parse_api_url(DEFAULT_API_URL)?,
        };
        let channel_url = match value(WS_URL_ENV) {
            Some(v) => parse_channel_url(&v)?,
            None => parse_channel_url(DEFAULT_WS_URL)?,
        };
        let reconnect_ms = match value(RECONNECT_MS_ENV) {
            Some(v) => parse_positive(RECONNECT_MS_ENV, &v)?,
            None => DEFAULT_RECONNECT_MS,
        };
        let timeout_secs = match value(REQUEST_TIMEOUT_ENV) {
            Some(v) => parse_positive(REQUEST_TIMEOUT_ENV, &v)?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            channel_url,
            reconnect_interval: Duration::from_millis(reconnect_ms),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Parse a REST base address (http or https)
pub fn parse_api_url(value: &str) -> Result<Url, ConfigError> {
    parse_url(API_URL_ENV, value, &["http", "https"], "http or https")
}

/// Parse a push channel address (ws or wss)
pub fn parse_channel_url(value: &str) -> Result<Url, ConfigError> {
    parse_url(WS_URL_ENV, value, &["ws", "wss"], "ws or wss")
}

fn parse_url(
    key: &'static str,
    value: &str,
    schemes: &[&str],
    expected: &'static str,
) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl {
        key,
        value: value.to_string(),
        source,
    })?;

    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::UnsupportedScheme {
            key,
            scheme: url.scheme().to_string(),
            expected,
        });
    }

    Ok(url)
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/api/v1");
        assert_eq!(config.channel_url.as_str(), "ws://localhost:8000/ws");
        assert_eq!(config.reconnect_interval, Duration::from_millis(5000));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (API_URL_ENV, "https://copilot.example.com/api/v1"),
            (WS_URL_ENV, "wss://copilot.example.com/ws"),
            (RECONNECT_MS_ENV, "250"),
        ]))
        .unwrap();

        assert_eq!(config.api_url.host_str(), Some("copilot.example.com"));
        assert_eq!(config.channel_url.scheme(), "wss");
        assert_eq!(config.reconnect_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = Config::from_lookup(lookup(&[(WS_URL_ENV, "  ")])).unwrap();
        assert_eq!(config.channel_url.as_str(), DEFAULT_WS_URL);
    }

    #[test]
    fn test_rejects_wrong_scheme() {
        let err = Config::from_lookup(lookup(&[(WS_URL_ENV, "http://localhost:8000/ws")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme { key: WS_URL_ENV, .. }));

        let err = parse_api_url("ws://localhost:8000").unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_rejects_garbage() {
        let err = Config::from_lookup(lookup(&[(API_URL_ENV, "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));

        let err = Config::from_lookup(lookup(&[(RECONNECT_MS_ENV, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
    }
}
