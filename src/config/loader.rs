//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Prefix checked before the bare variable name.
pub const ENV_PREFIX: &str = "REQUEST_POLICY_";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from a TOML file. Not validated.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Load an optional TOML file, apply environment overrides, then validate.
///
/// Without a file the defaults are used as the base.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config_file(path)?,
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment values on top of `config`.
///
/// For each key, `REQUEST_POLICY_{KEY}` is checked first, then `{KEY}`.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(&format!("{ENV_PREFIX}{key}")).or_else(|| lookup(key));

    if let Some(patterns) = get("CORS_ORIGIN_PATTERNS") {
        config.cors.origin_patterns = patterns;
    }

    if let Some(addr) = get("BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }

    if let Some(level) = get("LOG_LEVEL") {
        config.observability.log_level = level;
    }
}
