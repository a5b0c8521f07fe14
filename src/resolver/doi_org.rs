//! `doi.org` resolver - follows the DOI redirect chain to the hosting repository.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::doi::Doi;
use crate::error::RetrieveError;

use super::http_client::{HttpClientError, build_http_client};
use super::{DoiLookup, ResolvedUrl, is_error_status};

/// Resolves DOIs by issuing `GET {base_url}/{doi}` and following redirects.
pub struct DoiOrgResolver {
    client: Client,
    base_url: String,
}

impl DoiOrgResolver {
    /// Creates a resolver against `https://doi.org` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] if HTTP client construction fails.
    pub fn new() -> Result<Self, HttpClientError> {
        Self::from_config(&ClientConfig::default())
    }

    /// Creates a resolver from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] if HTTP client construction fails.
    #[tracing::instrument(skip_all, fields(base_url = %config.doi_base_url))]
    pub fn from_config(config: &ClientConfig) -> Result<Self, HttpClientError> {
        let client = build_http_client("doi.org", config)?;
        Ok(Self {
            client,
            base_url: config.doi_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a resolver with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] if HTTP client construction fails.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, HttpClientError> {
        Self::from_config(&ClientConfig::default().with_base_url(base_url))
    }

    fn lookup_url(&self, doi: &Doi) -> String {
        format!("{}/{}", self.base_url, doi.as_str())
    }
}

impl std::fmt::Debug for DoiOrgResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoiOrgResolver")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DoiLookup for DoiOrgResolver {
    #[tracing::instrument(skip(self, doi), fields(doi = %doi))]
    async fn resolve(&self, doi: &Doi) -> Result<ResolvedUrl, RetrieveError> {
        let lookup_url = self.lookup_url(doi);
        debug!(url = %lookup_url, "Resolving DOI");

        let response = match self.client.get(&lookup_url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "DOI resolution request failed");
                let reason = if e.is_timeout() {
                    "request to the DOI resolver timed out".to_string()
                } else {
                    format!("cannot reach the DOI resolver: {e}")
                };
                return Err(RetrieveError::resolution_failed(doi.as_str(), &reason));
            }
        };

        let status = response.status().as_u16();
        let url = response.url().clone();

        if is_error_status(status) {
            debug!(status, url = %url, "DOI resolved to an error response");
            return Err(RetrieveError::repository_not_found(
                doi.as_str(),
                url.as_str(),
                status,
            ));
        }

        debug!(status, url = %url, "DOI resolved");
        Ok(ResolvedUrl::new(url, status))
    }
}
