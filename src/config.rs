//! Client configuration for DOI resolution and dispatch.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::PROJECT_ISSUE_TRACKER;

/// Default DOI resolution endpoint.
pub const DEFAULT_DOI_BASE_URL: &str = "https://doi.org";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Catalog group under which repository adapters are registered.
pub const DATA_REPOSITORIES_GROUP: &str = "data_repositories";

/// Errors raised while loading or validating a [`ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document is not valid JSON or has mistyped fields
    #[error("invalid config document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A timeout lies outside the accepted range
    #[error("invalid config value for `{field}`: {value}. Expected range: 1..=3600")]
    TimeoutOutOfRange {
        /// Offending field name
        field: &'static str,
        /// Offending value
        value: u64,
    },

    /// The DOI endpoint is not an http(s) URL
    #[error("invalid config value for `doi_base_url`: '{value}' is not an http(s) URL")]
    InvalidBaseUrl {
        /// Offending value
        value: String,
    },

    /// The catalog group name is empty
    #[error("invalid config value for `catalog_group`: must not be empty")]
    EmptyCatalogGroup,
}

/// Networking and dispatch settings.
///
/// Every field has a default, so partial JSON documents deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL the DOI is appended to.
    pub doi_base_url: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// User-Agent override; the project default is used when absent.
    pub user_agent: Option<String>,
    /// Catalog group enumerated at dispatch time.
    pub catalog_group: String,
    /// Issue tracker quoted when no adapter supports a repository.
    pub issue_tracker: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            doi_base_url: DEFAULT_DOI_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            user_agent: None,
            catalog_group: DATA_REPOSITORIES_GROUP.to_string(),
            issue_tracker: PROJECT_ISSUE_TRACKER.to_string(),
        }
    }
}

impl ClientConfig {
    /// Parses a JSON document, applying defaults for missing fields, then validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for a malformed document, otherwise the
    /// first validation failure.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns a copy pointing at another DOI endpoint (for testing with wiremock).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.doi_base_url = base_url.into();
        self
    }

    /// Validates values against accepted ranges.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout_secs("timeout_secs", self.timeout_secs)?;
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;

        let base_ok = Url::parse(&self.doi_base_url)
            .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some());
        if !base_ok {
            return Err(ConfigError::InvalidBaseUrl {
                value: self.doi_base_url.clone(),
            });
        }

        if self.catalog_group.trim().is_empty() {
            return Err(ConfigError::EmptyCatalogGroup);
        }
        Ok(())
    }

    /// Whole-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn validate_timeout_secs(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if (1..=3600).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::TimeoutOutOfRange { field, value })
    }
}
