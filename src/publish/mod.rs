//! Posting pictures.
//!
//! ## Module Structure
//!
//! - [`oauth`]: OAuth 1.0a request signing (HMAC-SHA1)
//! - [`twitter`]: [`TwitterPublisher`], media upload followed by a post
//!
//! Credentials are resolved once at startup. A missing secret is a
//! [`ConfigError`] raised before the controller is constructed, so the
//! monitoring loop never runs without a way to publish.

pub mod oauth;
pub mod twitter;

pub use oauth::OAuthSigner;
pub use twitter::TwitterPublisher;

use anyhow::Result;
use std::fmt;
use std::path::Path;

use crate::common::constants::*;
use crate::config::TwitterSettings;
use crate::error::ConfigError;

/// Publishes one image per call. No caption and no retry.
#[cfg_attr(test, mockall::automock)]
pub trait Publisher {
    fn publish(&self, image: &Path) -> Result<()>;
}

/// The four OAuth 1.0a secrets. Values never appear in Debug output.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &"<redacted>")
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Resolve each secret from the environment first, then from the
    /// `[twitter]` settings table. Blank values count as missing.
    pub fn resolve<F>(env: F, settings: Option<&TwitterSettings>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &'static str, from_file: Option<&String>| {
            env(name)
                .filter(|value| !value.trim().is_empty())
                .or_else(|| {
                    from_file
                        .filter(|value| !value.trim().is_empty())
                        .cloned()
                })
                .ok_or(ConfigError::MissingCredential(name))
        };

        Ok(Self {
            consumer_key: lookup(
                ENV_CONSUMER_KEY,
                settings.and_then(|s| s.consumer_key.as_ref()),
            )?,
            consumer_secret: lookup(
                ENV_CONSUMER_SECRET,
                settings.and_then(|s| s.consumer_secret.as_ref()),
            )?,
            access_token: lookup(
                ENV_ACCESS_TOKEN,
                settings.and_then(|s| s.access_token.as_ref()),
            )?,
            access_token_secret: lookup(
                ENV_ACCESS_TOKEN_SECRET,
                settings.and_then(|s| s.access_token_secret.as_ref()),
            )?,
        })
    }
}
