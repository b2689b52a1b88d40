use std::{fs, path::Path};

use anyhow::{anyhow, Result};
use regex::Regex;
use tracing::debug;

use crate::config::settings::{LogFormat, LoggingConfig, SettingsConfig};
use crate::resilience::retry::RetrySettings;

/// Load settings from a YAML file, expanding `${VAR}` / `${VAR:default}`.
pub fn file_to_settings(path: &Path) -> Result<SettingsConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| anyhow!("cannot read settings file {}: {}", path.display(), e))?;
    parse_settings(&expand_env_vars(&content)?)
}

pub fn parse_settings(content: &str) -> Result<SettingsConfig> {
    let mut settings: SettingsConfig = serde_yaml::from_str(content)
        .map_err(|e| anyhow!("Invalid settings format: {}", e))?;

    // Apply defaults
    if settings.logging.is_none() {
        settings.logging = Some(LoggingConfig { level: "info".to_owned(), format: LogFormat::Compact });
    }
    validate(&settings)?;
    debug!("settings loaded: {:?}", settings);
    Ok(settings)
}

/// Settings from `path` when given, built-in defaults otherwise.
pub fn load(path: Option<&str>) -> Result<SettingsConfig> {
    match path {
        Some(path) => file_to_settings(Path::new(path)),
        None => Ok(SettingsConfig::default()),
    }
}

fn validate(settings: &SettingsConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();
    let retry = RetrySettings::from_config(&settings.retry);
    if retry.max_delay_ms < retry.base_delay_ms {
        errors.push(format!(
            "retry.max_delay_ms ({}) must be >= retry.base_delay_ms ({})",
            retry.max_delay_ms, retry.base_delay_ms
        ));
    }
    if !settings.metrics.path.starts_with('/') {
        errors.push(format!("metrics.path '{}' must start with '/'", settings.metrics.path));
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!("server.port '{}' is not a valid port", settings.server.port));
    }
    match errors.is_empty() {
        true => Ok(()),
        false => Err(anyhow!("invalid settings: {}", errors.join("; "))),
    }
}

fn expand_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}")?;
    let expanded = re.replace_all(input, |caps: &regex::Captures| {
        let var = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var).unwrap_or_else(|_| default.to_string())
    })
    .to_string();
    Ok(expanded)
}
