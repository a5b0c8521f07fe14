//! Retrieval facade: DOI + file name to a local file.
//!
//! [`DoiRetriever`] composes validation, dispatch and the selected adapter
//! into a final `(url, hash)` pair, then hands the transfer to an external
//! [`Fetcher`]. Downloading, hash verification and caching are the fetcher's
//! job.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::adapter::AdapterCatalog;
use crate::config::ClientConfig;
use crate::dispatch::Dispatcher;
use crate::doi::Doi;
use crate::error::{FetchError, RetrieveError};
use crate::resolver::HttpClientError;

/// Post-download hook applied by the fetcher (decompression, unpacking, ...).
pub trait Processor: Send + Sync + fmt::Debug {
    /// Processes the downloaded file at `path` and returns the path to hand back.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Processor`] when processing fails.
    fn process(&self, path: &Path) -> Result<PathBuf, FetchError>;
}

/// Custom transfer strategy used by the fetcher instead of its default.
#[async_trait]
pub trait Downloader: Send + Sync + fmt::Debug {
    /// Downloads `url` into `output`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the transfer fails.
    async fn download(&self, url: &str, output: &Path) -> Result<(), FetchError>;
}

/// Everything the fetch collaborator needs for one file.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Direct download URL produced by the selected adapter.
    pub url: String,
    /// Expected content hash; always present.
    pub known_hash: String,
    /// Name the file is stored under.
    pub file_name: String,
    /// Destination directory; the fetcher's default when `None`.
    pub path: Option<PathBuf>,
    /// Optional post-download processor.
    pub processor: Option<Arc<dyn Processor>>,
    /// Optional custom downloader.
    pub downloader: Option<Arc<dyn Downloader>>,
    /// Whether to show transfer progress.
    pub progress: bool,
}

/// External fetch collaborator: downloads, verifies and stores a file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the file described by `request` and returns its local path.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transfer, verification or processing failure.
    async fn fetch(&self, request: FetchRequest) -> Result<PathBuf, FetchError>;
}

/// A caller's request to retrieve one file of a DOI archive.
#[derive(Debug, Clone)]
pub struct RetrieveRequest {
    doi: String,
    file_name: String,
    known_hash: Option<String>,
    path: Option<PathBuf>,
    processor: Option<Arc<dyn Processor>>,
    downloader: Option<Arc<dyn Downloader>>,
    progress: bool,
}

impl RetrieveRequest {
    /// Creates a request for `file_name` in the archive identified by `doi`.
    #[must_use]
    pub fn new(doi: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            doi: doi.into(),
            file_name: file_name.into(),
            known_hash: None,
            path: None,
            processor: None,
            downloader: None,
            progress: false,
        }
    }

    /// Supplies the expected hash, skipping the registry lookup.
    #[must_use]
    pub fn known_hash(mut self, hash: impl Into<String>) -> Self {
        self.known_hash = Some(hash.into());
        self
    }

    /// Sets the destination directory.
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the post-download processor.
    #[must_use]
    pub fn processor(mut self, processor: Arc<dyn Processor>) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Sets a custom downloader.
    #[must_use]
    pub fn downloader(mut self, downloader: Arc<dyn Downloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    /// Enables or disables progress display.
    #[must_use]
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// The raw DOI as supplied.
    #[must_use]
    pub fn doi(&self) -> &str {
        &self.doi
    }

    /// The requested file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Public entry point: DOI and file name in, local path out.
pub struct DoiRetriever {
    dispatcher: Dispatcher,
    fetcher: Arc<dyn Fetcher>,
}

impl DoiRetriever {
    /// Creates a retriever from a configured dispatcher and fetcher.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            dispatcher,
            fetcher,
        }
    }

    /// Creates a retriever resolving through `doi.org` per `config`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] if the HTTP client cannot be built.
    pub fn from_config(
        catalog: Arc<dyn AdapterCatalog>,
        config: &ClientConfig,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, HttpClientError> {
        Ok(Self::new(Dispatcher::from_config(catalog, config)?, fetcher))
    }

    /// The dispatcher used to select adapters.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Retrieves one file of a DOI archive.
    ///
    /// # Errors
    ///
    /// - [`RetrieveError::InvalidDoi`] before any network activity
    /// - resolution and dispatch errors, unchanged
    /// - [`RetrieveError::FileNotInRegistry`] when no hash was supplied and the
    ///   adapter's registry lacks the file
    /// - [`RetrieveError::AdapterFault`] when the selected adapter fails
    /// - [`RetrieveError::Fetch`] when the fetcher fails
    #[tracing::instrument(
        skip(self, request),
        fields(doi = %request.doi, file = %request.file_name)
    )]
    pub async fn retrieve_from_doi(
        &self,
        request: RetrieveRequest,
    ) -> Result<PathBuf, RetrieveError> {
        let doi = Doi::parse(&request.doi)?;
        let selected = self.dispatcher.dispatch(&doi).await?;

        let known_hash = match request.known_hash {
            Some(hash) => hash,
            None => {
                debug!(adapter = %selected.info().name, "No hash supplied, consulting registry");
                let registry = selected.create_registry().await?;
                registry
                    .require_hash(&request.file_name, doi.as_str())?
                    .to_string()
            }
        };

        let url = selected.download_url(&request.file_name).await?;
        info!(url = %url, adapter = %selected.info().name, "Handing off to fetcher");

        let fetch_request = FetchRequest {
            url: url.clone(),
            known_hash,
            file_name: request.file_name,
            path: request.path,
            processor: request.processor,
            downloader: request.downloader,
            progress: request.progress,
        };
        self.fetcher
            .fetch(fetch_request)
            .await
            .map_err(|e| RetrieveError::fetch(&url, e))
    }
}

impl fmt::Debug for DoiRetriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoiRetriever")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
