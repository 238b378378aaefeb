use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::error;

use crate::config::settings::SettingsConfig;

/// Load settings from a YAML file, expanding `${VAR}` and `${VAR:default}`.
pub fn file_to_config(path: &Path) -> Result<SettingsConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    parse_config(&expand_env_vars(&content))
}

pub fn parse_config(content: &str) -> Result<SettingsConfig> {
    let config: SettingsConfig = serde_yaml::from_str(content)
        .inspect_err(|e| error!("parse config error: {}", e))
        .context("invalid settings format")?;

    if config.auth.token_ttl_leeway < 0 {
        anyhow::bail!("auth.token_ttl_leeway must not be negative");
    }
    if let Some(retry) = &config.retry {
        if let (Some(base), Some(max)) = (retry.base_delay_ms, retry.max_delay_ms) {
            if max < base {
                anyhow::bail!("retry.max_delay_ms must be >= retry.base_delay_ms");
            }
        }
    }
    Ok(config)
}

fn expand_env_vars(input: &str) -> String {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}").expect("static pattern");
    re.replace_all(input, |caps: &regex::Captures| {
        let var = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::LogFormat;
    use std::io::Write;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config = parse_config("auth:\n  scopes: [\"https://www.googleapis.com/auth/bigquery\"]\n").unwrap();
        assert_eq!(config.auth.scopes, vec!["https://www.googleapis.com/auth/bigquery"]);
        assert_eq!(config.auth.default_token_ttl, 3600);
        assert_eq!(config.auth.token_ttl_leeway, 40);
        assert_eq!(config.auth.timeout_seconds, 10);
        assert!(config.retry.is_none());
        assert!(config.logging.is_none());
    }

    #[test]
    fn rejects_inverted_retry_delays() {
        let err = parse_config("retry:\n  base_delay_ms: 500\n  max_delay_ms: 100\n").unwrap_err();
        assert!(err.to_string().contains("max_delay_ms"));
    }

    #[test]
    fn expands_environment_with_defaults() {
        let expanded = expand_env_vars("level: ${GCLOUD_REST_SURELY_UNSET_VAR:debug}");
        assert_eq!(expanded, "level: debug");
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  level: warn\n  format: json\nauth:\n  anonymous: true").unwrap();
        let config = file_to_config(file.path()).unwrap();
        let logging = config.logging.unwrap();
        assert_eq!(logging.level, "warn");
        assert_eq!(logging.format, LogFormat::Json);
        assert!(config.auth.anonymous);
    }
}
