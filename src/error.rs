//! Typed configuration errors.
//!
//! Everything else in the crate travels as `anyhow::Error`; configuration
//! problems get their own type so `main` can tell "fix your settings" apart
//! from a hardware or network failure.

use thiserror::Error;

/// Problems detected before the monitoring loop starts.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A required secret is absent from both the environment and the settings file
    #[error(
        "Twitter credentials must be provided: {0} is missing (set the environment variable or the [twitter] table in the settings file)"
    )]
    MissingCredential(&'static str),

    /// City lookup found nothing
    #[error("Unknown city '{0}'; use 'Name' or 'Name, Country', or set latitude/longitude")]
    UnknownCity(String),

    /// A setting is present but out of range or malformed
    #[error("Invalid setting '{field}': {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    /// The settings file exists but could not be parsed
    #[error("Failed to parse settings file {path}: {reason}")]
    InvalidFile { path: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidSetting {
            field,
            reason: reason.into(),
        }
    }
}

/// Find a [`ConfigError`] anywhere in an error chain.
pub fn find_config_error(error: &anyhow::Error) -> Option<&ConfigError> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<ConfigError>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_find_config_error_through_context() {
        let result: anyhow::Result<()> =
            Err(ConfigError::MissingCredential("TWITTER_ACCESS_TOKEN")).context("Startup failed");
        let error = result.unwrap_err();
        assert_eq!(
            find_config_error(&error),
            Some(&ConfigError::MissingCredential("TWITTER_ACCESS_TOKEN"))
        );
    }

    #[test]
    fn test_other_errors_are_not_config_errors() {
        let error = anyhow::anyhow!("camera exploded");
        assert!(find_config_error(&error).is_none());
    }
}
