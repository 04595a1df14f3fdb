//! Configuration for talking to the conversion backend.
//!
//! Everything the network layer needs is resolved once, at process start,
//! into a [`ClientConfig`] and then injected into
//! [`crate::pipeline::http::ApiClient`]. Nothing below this layer reads the
//! environment on its own.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Environment variable holding the backend base URL.
pub const ENV_API_BASE: &str = "FILECONV_API_BASE";

/// Environment variable selecting the message locale (`en`, `ru`).
pub const ENV_LOCALE: &str = "FILECONV_LOCALE";

/// Configuration for the backend client.
///
/// Built via [`ClientConfig::builder()`], [`ClientConfig::from_env()`] or
/// [`ClientConfig::default()`].
///
/// # Example
/// ```rust
/// use fileconv::{ClientConfig, Locale};
///
/// let config = ClientConfig::builder()
///     .base_url("http://localhost:8080")
///     .locale(Locale::Ru)
///     .conversion_timeout_secs(120)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url, "http://localhost:8080");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every API path is appended to. Default: empty (same-origin).
    ///
    /// A native process has no origin to be relative to, so requests made
    /// with an empty base fail with [`ConvertError::InvalidBaseUrl`].
    pub base_url: String,

    /// Language of user-facing workflow messages. Default: [`Locale::En`].
    pub locale: Locale,

    /// Timeout for the format registry lookup, in seconds. Default: 30.
    pub discovery_timeout_secs: u64,

    /// Timeout for the conversion upload + download, in seconds. Default: 300.
    ///
    /// Large images round-trip through the service twice (upload, then the
    /// transcoded body), so this is an order of magnitude above discovery.
    pub conversion_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            locale: Locale::default(),
            discovery_timeout_secs: 30,
            conversion_timeout_secs: 300,
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve configuration from [`ENV_API_BASE`] and [`ENV_LOCALE`].
    ///
    /// Unset variables fall back to defaults. An unrecognised locale is an
    /// error rather than a silent fallback.
    pub fn from_env() -> Result<Self, ConvertError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`], reading variables through `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConvertError> {
        let mut builder = Self::builder();
        if let Some(base) = lookup(ENV_API_BASE) {
            builder = builder.base_url(base);
        }
        if let Some(locale) = lookup(ENV_LOCALE) {
            if !locale.trim().is_empty() {
                builder = builder.locale(locale.parse()?);
            }
        }
        builder.build()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.config.locale = locale;
        self
    }

    pub fn discovery_timeout_secs(mut self, secs: u64) -> Self {
        self.config.discovery_timeout_secs = secs;
        self
    }

    pub fn conversion_timeout_secs(mut self, secs: u64) -> Self {
        self.config.conversion_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, ConvertError> {
        let c = &self.config;
        if !c.base_url.is_empty() {
            let parsed = reqwest::Url::parse(&c.base_url).map_err(|e| {
                ConvertError::InvalidConfig(format!("base URL '{}': {}", c.base_url, e))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConvertError::InvalidConfig(format!(
                    "base URL must be http or https, got '{}'",
                    parsed.scheme()
                )));
            }
        }
        if c.discovery_timeout_secs == 0 || c.conversion_timeout_secs == 0 {
            return Err(ConvertError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Language used for workflow messages shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English (default).
    #[default]
    En,
    /// Russian, the backend's native language.
    Ru,
}

impl FromStr for Locale {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "ru" | "russian" => Ok(Locale::Ru),
            other => Err(ConvertError::InvalidConfig(format!(
                "unknown locale '{other}' (expected en or ru)"
            ))),
        }
    }
}
