//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is read from environment variables at startup. A `.env`
//! file in the working directory is honoured for local development.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use tracing::Level;

pub const API_URL_VAR: &str = "SCREENING_API_URL";
pub const LOG_LEVEL_VAR: &str = "RUST_LOG";
pub const TIMEOUT_VAR: &str = "SCREENING_TIMEOUT_SECS";
pub const TOKEN_PATH_VAR: &str = "SCREENING_TOKEN_PATH";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TOKEN_PATH: &str = ".screening/auth-token";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL every REST path is resolved against.
    pub api_url: Url,
    pub log_level: Level,
    pub request_timeout: Duration,
    pub token_path: PathBuf,
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// The `.env` file is skipped under test so tests stay hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup(API_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar(API_URL_VAR.to_string()))?;
        let api_url = parse_base_url(raw_url.trim())?;

        let log_level_str = lookup(LOG_LEVEL_VAR).unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                LOG_LEVEL_VAR.to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let request_timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| {
                    ConfigError::InvalidValue(TIMEOUT_VAR.to_string(), e.to_string())
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue(
                        TIMEOUT_VAR.to_string(),
                        "must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let token_path = lookup(TOKEN_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH));

        Ok(Self {
            api_url,
            log_level,
            request_timeout,
            token_path,
        })
    }
}

/// Parses an absolute http(s) URL and makes sure relative joins keep its path.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidValue(API_URL_VAR.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue(
            API_URL_VAR.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
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
    fn applies_defaults() {
        let config = Config::from_lookup(lookup(&[(API_URL_VAR, "https://api.example.com/v1")])).unwrap();
        assert_eq!(config.api_url.as_str(), "https://api.example.com/v1/");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.token_path, PathBuf::from(DEFAULT_TOKEN_PATH));
    }

    #[test]
    fn requires_api_url() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref v) if v == API_URL_VAR));
    }

    #[test]
    fn rejects_bad_values() {
        let err = Config::from_lookup(lookup(&[(API_URL_VAR, "ftp://files.example.com")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(..)));

        let err = Config::from_lookup(lookup(&[
            (API_URL_VAR, "http://localhost:8080"),
            (TIMEOUT_VAR, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == TIMEOUT_VAR));

        let err = Config::from_lookup(lookup(&[
            (API_URL_VAR, "http://localhost:8080"),
            (LOG_LEVEL_VAR, "chatty"),
        ]))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for the environment variable RUST_LOG: 'chatty' is not a valid log level"
        );
    }

    #[test]
    fn base_url_keeps_its_path_when_joining() {
        let url = parse_base_url("http://localhost:8080/api").unwrap();
        assert_eq!(url.join("jds").unwrap().as_str(), "http://localhost:8080/api/jds");
    }
}
