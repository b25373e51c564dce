//! Configuration loading for the ginger server

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 30;

/// Errors raised while loading configuration. Any of these is fatal at
/// startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not defined")]
    MissingApiKey,

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Generative model provider settings
#[derive(Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to listen on
    pub bind: SocketAddr,
    /// Model provider
    pub model: ModelConfig,
}

impl Config {
    /// Load configuration from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let bind_value = lookup("GINGER_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_value.parse().map_err(|_| ConfigError::Invalid {
            key: "GINGER_BIND",
            value: bind_value.clone(),
        })?;

        let timeout_secs = match lookup("GINGER_MODEL_TIMEOUT_SECS") {
            Some(value) => value.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "GINGER_MODEL_TIMEOUT_SECS",
                value,
            })?,
            None => DEFAULT_MODEL_TIMEOUT_SECS,
        };

        Ok(Self {
            bind,
            model: ModelConfig {
                api_key,
                model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: lookup("GEMINI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);
        assert_eq!(err.to_string(), "GEMINI_API_KEY is not defined");

        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(config.bind.port(), 3000);
        assert_eq!(config.model.model, DEFAULT_MODEL);
        assert_eq!(config.model.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_bind() {
        let err = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("GINGER_BIND", "not-an-address"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "GINGER_BIND", .. }));
    }

    #[test]
    fn test_api_key_is_redacted() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "secret-key")])).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("redacted"));
    }
}
