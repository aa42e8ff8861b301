//! Configuration loading functionality.
//!
//! Resolves the settings path, parses TOML, applies environment overrides and
//! runs validation.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;
use super::validation::validate_config;
use crate::common::constants::*;
use crate::common::utils::private_path;
use crate::error::ConfigError;

/// Settings file path for an optional custom directory.
pub fn config_path(custom_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = custom_dir {
        return Ok(dir.join(CONFIG_FILE_NAME));
    }

    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join(APP_NAME).join(CONFIG_FILE_NAME))
}

/// Load settings, falling back to defaults when the default file is absent.
///
/// A custom directory must contain the settings file; a missing file there is
/// treated as a mistake rather than silently running on defaults.
pub fn load(custom_dir: Option<&Path>) -> Result<Config> {
    let path = config_path(custom_dir)?;

    if !path.exists() {
        if custom_dir.is_some() {
            return Err(ConfigError::InvalidFile {
                path: private_path(&path),
                reason: "file not found".to_string(),
            }
            .into());
        }
        return finish(Config::default(), |key| std::env::var(key).ok());
    }

    load_from_path(&path)
}

/// Load settings from a specific file.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let config = parse(&content, &private_path(path))?;
    finish(config, |key| std::env::var(key).ok())
}

/// Parse TOML content without touching the environment or validating.
pub fn parse(content: &str, origin: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| {
        ConfigError::InvalidFile {
            path: origin.to_string(),
            reason: e.message().to_string(),
        }
        .into()
    })
}

/// Apply environment overrides, then validate.
pub fn finish<F>(mut config: Config, env: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env_overrides(&mut config, env);
    validate_config(&config)?;
    Ok(config)
}

/// `CITY` replaces the configured city and drops any configured coordinates,
/// matching how the variable selects the location on its own.
pub fn apply_env_overrides<F>(config: &mut Config, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(city) = env(ENV_CITY).filter(|c| !c.trim().is_empty()) {
        config.city = Some(city.trim().to_string());
        config.latitude = None;
        config.longitude = None;
    }
}
