//! Client Configuration
//!
//! Defaults mirror the production web client; every value can be overridden
//! from the environment (a `.env` file is honoured by the binary).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::device::PositionOptions;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_SESSION_FILE: &str = "session.json";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);

#[derive(Debug, Error, PartialEq)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Configuration for the evidence client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to
    pub api_base_url: String,
    /// Per-request timeout for backend calls
    pub request_timeout: Duration,
    /// Where local images are uploaded before submission, if anywhere
    pub upload_url: Option<String>,
    /// Path of the persisted auth session
    pub session_file: PathBuf,
    /// One-shot geolocation request options
    pub geolocation: PositionOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            upload_url: None,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            geolocation: PositionOptions::default(),
        }
    }
}

impl ClientConfig {
    /// Build from process environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (used by tests to avoid touching the process env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("EVIDENCE_API_URL") {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup("EVIDENCE_API_TIMEOUT_MS") {
            config.request_timeout = parse_millis("EVIDENCE_API_TIMEOUT_MS", &raw)?;
        }
        config.upload_url = lookup("EVIDENCE_UPLOAD_URL").filter(|u| !u.trim().is_empty());
        if let Some(path) = lookup("EVIDENCE_SESSION_FILE") {
            config.session_file = PathBuf::from(path);
        }
        if let Some(raw) = lookup("EVIDENCE_GEO_TIMEOUT_MS") {
            config.geolocation.timeout = parse_millis("EVIDENCE_GEO_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = lookup("EVIDENCE_GEO_MAX_AGE_MS") {
            config.geolocation.maximum_age = parse_millis("EVIDENCE_GEO_MAX_AGE_MS", &raw)?;
        }
        if let Some(raw) = lookup("EVIDENCE_GEO_HIGH_ACCURACY") {
            config.geolocation.enable_high_accuracy = parse_bool("EVIDENCE_GEO_HIGH_ACCURACY", &raw)?;
        }

        Ok(config)
    }
}

fn parse_millis(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| ConfigError {
            var,
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError {
            var,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.api_base_url, "http://localhost:8080/api");
        assert_eq!(config.geolocation.timeout, Duration::from_secs(10));
        assert_eq!(config.geolocation.maximum_age, Duration::from_secs(300));
        assert!(config.geolocation.enable_high_accuracy);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("EVIDENCE_API_URL", "https://habits.example.com/api/"),
            ("EVIDENCE_API_TIMEOUT_MS", "2500"),
            ("EVIDENCE_UPLOAD_URL", "https://cdn.example.com/upload"),
            ("EVIDENCE_GEO_HIGH_ACCURACY", "off"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "https://habits.example.com/api");
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.upload_url.as_deref(), Some("https://cdn.example.com/upload"));
        assert!(!config.geolocation.enable_high_accuracy);
    }

    #[test]
    fn test_invalid_value_names_variable() {
        let err = ClientConfig::from_lookup(lookup(&[("EVIDENCE_GEO_MAX_AGE_MS", "soon")])).unwrap_err();
        assert_eq!(err.var, "EVIDENCE_GEO_MAX_AGE_MS");
        assert!(err.to_string().contains("soon"));
    }
}
