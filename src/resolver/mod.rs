//! DOI to landing-page resolution.
//!
//! # Architecture
//!
//! - [`DoiLookup`] - Async trait turning a validated [`Doi`] into a [`ResolvedUrl`]
//! - [`DoiOrgResolver`] - Default implementation following the `doi.org` redirect chain
//! - [`build_http_client`] - Shared HTTP client policy, also available to adapters
//!
//! # Example
//!
//! ```no_run
//! use doi_dispatch::resolver::{DoiLookup, DoiOrgResolver};
//! use doi_dispatch::Doi;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = DoiOrgResolver::new()?;
//! let doi = Doi::parse("10.5281/zenodo.17544720")?;
//! let resolved = resolver.resolve(&doi).await?;
//! println!("{} ({})", resolved.url, resolved.status);
//! # Ok(())
//! # }
//! ```

mod doi_org;
mod http_client;

pub use doi_org::DoiOrgResolver;
pub use http_client::{HttpClientError, build_http_client};

use async_trait::async_trait;
use url::Url;

use crate::doi::Doi;
use crate::error::RetrieveError;

/// The landing URL a DOI resolves to, with the terminal HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    /// Final URL after redirects.
    pub url: Url,
    /// HTTP status of the final response.
    pub status: u16,
}

impl ResolvedUrl {
    /// Creates a resolved URL.
    #[must_use]
    pub fn new(url: Url, status: u16) -> Self {
        Self { url, status }
    }

    /// Host of the resolved URL, or an empty string for host-less URLs.
    #[must_use]
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// The resolved URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

/// Resolves DOIs to repository landing URLs.
///
/// Implementations perform exactly one attempt per call; retry policy
/// belongs to the caller.
#[async_trait]
pub trait DoiLookup: Send + Sync {
    /// Resolves `doi` to the URL of the archive hosting it.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieveError::RepositoryNotFound`] for 4xx/5xx terminal
    /// responses and [`RetrieveError::ResolutionFailed`] for transport errors.
    async fn resolve(&self, doi: &Doi) -> Result<ResolvedUrl, RetrieveError>;
}

/// Returns true for the status range treated as "DOI not found".
#[must_use]
pub fn is_error_status(status: u16) -> bool {
    (400..600).contains(&status)
}
