use std::path::PathBuf;

use serde::Deserialize;

use crate::utils::constants::{DEFAULT_REFRESH_TIMEOUT_SECS, DEFAULT_TOKEN_TTL_LEEWAY_SECS, DEFAULT_TOKEN_TTL_SECS};

/// ================================
/// Full settings file
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsConfig {
    #[serde(default)]
    pub auth: AuthConfig,
    pub retry: Option<RetryConfig>,
    pub logging: Option<LoggingConfig>,
}

/// ================================
/// Token acquisition
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// explicit credentials file; discovery is used when unset
    pub credentials: Option<PathBuf>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default = "default_token_ttl")]
    pub default_token_ttl: i64,
    /// refresh this many seconds before the token expires
    #[serde(default = "default_token_ttl_leeway")]
    pub token_ttl_leeway: i64,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub anonymous: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            scopes: Vec::new(),
            default_token_ttl: DEFAULT_TOKEN_TTL_SECS,
            token_ttl_leeway: DEFAULT_TOKEN_TTL_LEEWAY_SECS,
            timeout_seconds: DEFAULT_REFRESH_TIMEOUT_SECS,
            anonymous: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub attempts: Option<u32>,
    /// will be mutiply by 2 on every attempt until max_delay_ms
    pub base_delay_ms: Option<u64>,
    /// invariant: >= base_delay_ms
    pub max_delay_ms: Option<u64>,
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), format: LogFormat::Compact }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_token_ttl() -> i64 {
    DEFAULT_TOKEN_TTL_SECS
}

fn default_token_ttl_leeway() -> i64 {
    DEFAULT_TOKEN_TTL_LEEWAY_SECS
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_REFRESH_TIMEOUT_SECS
}
