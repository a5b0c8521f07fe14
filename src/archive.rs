//! Registry-backed handle on one DOI archive.
//!
//! A [`DoiArchive`] binds a local cache directory to a DOI and keeps the
//! archive's [`FileRegistry`]. Fetches go through the [`DoiRetriever`] with
//! the registry hash and the archive directory filled in.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::adapter::FileRegistry;
use crate::doi::Doi;
use crate::error::RetrieveError;
use crate::retrieve::{DoiRetriever, Downloader, Processor, RetrieveRequest};

/// Local view of a DOI archive and its file registry.
#[derive(Debug)]
pub struct DoiArchive {
    retriever: Arc<DoiRetriever>,
    path: PathBuf,
    doi: Doi,
    registry: FileRegistry,
}

impl DoiArchive {
    /// Creates an archive handle with an empty registry.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieveError::InvalidDoi`] if `doi` is malformed.
    pub fn new(
        retriever: Arc<DoiRetriever>,
        path: impl Into<PathBuf>,
        doi: &str,
    ) -> Result<Self, RetrieveError> {
        Ok(Self {
            retriever,
            path: path.into(),
            doi: Doi::parse(doi)?,
            registry: FileRegistry::new(),
        })
    }

    /// Creates an archive handle, loading the registry from the repository
    /// when `populate_registry` is set.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieveError::InvalidDoi`] for a malformed DOI and any
    /// [`DoiArchive::load_registry_from_doi`] error when populating.
    pub async fn open(
        retriever: Arc<DoiRetriever>,
        path: impl Into<PathBuf>,
        doi: &str,
        populate_registry: bool,
    ) -> Result<Self, RetrieveError> {
        let mut archive = Self::new(retriever, path, doi)?;
        if populate_registry {
            archive.load_registry_from_doi().await?;
        }
        Ok(archive)
    }

    /// Replaces the registry with the one published by the archive's repository.
    ///
    /// Returns the number of registered files.
    ///
    /// # Errors
    ///
    /// Returns resolution/dispatch errors, or [`RetrieveError::AdapterFault`]
    /// when the selected adapter cannot list the archive.
    #[tracing::instrument(skip(self), fields(doi = %self.doi))]
    pub async fn load_registry_from_doi(&mut self) -> Result<usize, RetrieveError> {
        let selected = self.retriever.dispatcher().dispatch(&self.doi).await?;
        self.registry = selected.create_registry().await?;
        info!(
            files = self.registry.len(),
            adapter = %selected.info().name,
            "Registry loaded"
        );
        Ok(self.registry.len())
    }

    /// The archive DOI.
    #[must_use]
    pub fn doi(&self) -> &Doi {
        &self.doi
    }

    /// Local cache directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current registry.
    #[must_use]
    pub fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    /// Fetches `file_name` into the archive directory, verified against its registry hash.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieveError::FileNotInRegistry`] if the file is not
    /// registered, otherwise any [`DoiRetriever::retrieve_from_doi`] error.
    pub async fn fetch(
        &self,
        file_name: &str,
        processor: Option<Arc<dyn Processor>>,
        downloader: Option<Arc<dyn Downloader>>,
        progress: bool,
    ) -> Result<PathBuf, RetrieveError> {
        let hash = self.registered_hash(file_name)?;
        debug!(file = file_name, hash, "Fetching registered file");

        let mut request = RetrieveRequest::new(self.doi.as_str(), file_name)
            .known_hash(hash)
            .path(self.path.clone())
            .progress(progress);
        if let Some(processor) = processor {
            request = request.processor(processor);
        }
        if let Some(downloader) = downloader {
            request = request.downloader(downloader);
        }
        self.retriever.retrieve_from_doi(request).await
    }

    /// Availability probing is not supported for DOI archives.
    ///
    /// # Errors
    ///
    /// Always fails: [`RetrieveError::FileNotInRegistry`] for unknown files,
    /// [`RetrieveError::AvailabilityUnsupported`] otherwise.
    pub fn is_available(&self, file_name: &str) -> Result<bool, RetrieveError> {
        self.registered_hash(file_name)?;
        Err(RetrieveError::AvailabilityUnsupported {
            file_name: file_name.to_string(),
        })
    }

    fn registered_hash(&self, file_name: &str) -> Result<&str, RetrieveError> {
        self.registry.require_hash(file_name, self.doi.as_str())
    }
}
