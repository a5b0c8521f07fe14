//! Repository dispatch: selects the adapter that owns a DOI.
//!
//! The [`Dispatcher`] implements a chain of responsibility over the adapters
//! registered in an [`AdapterCatalog`]:
//!
//! 1. Load every factory registered under the configured group
//! 2. Stable-sort so that factories whose `claim` needs no network go first
//! 3. Resolve the DOI once
//! 4. Probe each factory in order; errors and panics are reported and skipped
//! 5. Return the first claim, emitting its user warning if it has one
//! 6. Otherwise fail with [`RetrieveError::UnsupportedRepository`]

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{debug, info, warn};

use crate::adapter::{
    AdapterCatalog, AdapterFactory, AdapterInfo, Claim, FileRegistry, RepositoryAdapter,
};
use crate::config::ClientConfig;
use crate::doi::Doi;
use crate::error::{AdapterError, RetrieveError};
use crate::resolver::{DoiLookup, DoiOrgResolver, HttpClientError, ResolvedUrl};

/// A warning raised during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchWarning {
    /// A catalog entry could not be loaded and was skipped.
    LoaderFailed {
        /// Catalog entry name
        entry: String,
        /// Load failure description
        error: String,
    },
    /// An adapter raised while evaluating the resolved URL and was skipped.
    AdapterFailed {
        /// Adapter display name
        adapter: String,
        /// Failure description
        error: String,
        /// Adapter issue tracker, when declared
        issue_tracker: Option<String>,
    },
    /// The selected adapter declared a user-facing warning.
    UserWarning {
        /// Adapter display name
        adapter: String,
        /// The declared warning
        message: String,
    },
}

impl fmt::Display for DispatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoaderFailed { entry, error } => {
                write!(f, "Repository entry {entry} could not be loaded: {error}.")
            }
            Self::AdapterFailed {
                adapter,
                error,
                issue_tracker,
            } => {
                write!(f, "Repository {adapter} failed with exception: {error}.")?;
                if let Some(tracker) = issue_tracker {
                    write!(f, " Please open an issue at {tracker}.")?;
                }
                Ok(())
            }
            Self::UserWarning { adapter, message } => {
                write!(f, "Selected repository {adapter} issued a warning: {message}")
            }
        }
    }
}

/// Destination for dispatch warnings.
///
/// Handed to the [`Dispatcher`] at construction and never swapped mid-dispatch.
pub trait WarningSink: Send + Sync {
    /// Records one warning. Called in the order warnings occur.
    fn warn(&self, warning: &DispatchWarning);
}

/// Default sink forwarding warnings to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWarnings;

impl WarningSink for TracingWarnings {
    fn warn(&self, warning: &DispatchWarning) {
        warn!(target: "doi_dispatch", "{warning}");
    }
}

/// The adapter chosen for a DOI, with its metadata.
pub struct SelectedAdapter {
    info: AdapterInfo,
    doi: Doi,
    resolved: ResolvedUrl,
    adapter: Box<dyn RepositoryAdapter>,
}

impl SelectedAdapter {
    /// Metadata of the selected repository.
    #[must_use]
    pub fn info(&self) -> &AdapterInfo {
        &self.info
    }

    /// The DOI the adapter was selected for.
    #[must_use]
    pub fn doi(&self) -> &Doi {
        &self.doi
    }

    /// The landing URL the adapter claimed.
    #[must_use]
    pub fn resolved(&self) -> &ResolvedUrl {
        &self.resolved
    }

    /// Resolves the download URL of `file_name`.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieveError::AdapterFault`] when the adapter fails.
    pub async fn download_url(&self, file_name: &str) -> Result<String, RetrieveError> {
        self.adapter
            .download_url(file_name)
            .await
            .map_err(|e| self.fault(e))
    }

    /// Builds the archive's file registry.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieveError::AdapterFault`] when the adapter fails.
    pub async fn create_registry(&self) -> Result<FileRegistry, RetrieveError> {
        self.adapter.create_registry().await.map_err(|e| self.fault(e))
    }

    fn fault(&self, error: AdapterError) -> RetrieveError {
        RetrieveError::adapter_fault(&self.info.name, self.info.issue_tracker.as_deref(), error)
    }
}

impl fmt::Debug for SelectedAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedAdapter")
            .field("adapter", &self.info.name)
            .field("doi", &self.doi)
            .field("resolved", &self.resolved.as_str())
            .finish_non_exhaustive()
    }
}

/// Chain-of-responsibility dispatch over catalog-registered adapters.
pub struct Dispatcher {
    catalog: Arc<dyn AdapterCatalog>,
    resolver: Arc<dyn DoiLookup>,
    warnings: Arc<dyn WarningSink>,
    group: String,
    issue_tracker: String,
}

impl Dispatcher {
    /// Creates a dispatcher with explicit collaborators and default group/issue tracker.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn AdapterCatalog>,
        resolver: Arc<dyn DoiLookup>,
        warnings: Arc<dyn WarningSink>,
    ) -> Self {
        let defaults = ClientConfig::default();
        Self {
            catalog,
            resolver,
            warnings,
            group: defaults.catalog_group,
            issue_tracker: defaults.issue_tracker,
        }
    }

    /// Creates a dispatcher resolving through `doi.org` per `config`, warning via `tracing`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] if the resolver's HTTP client cannot be built.
    pub fn from_config(
        catalog: Arc<dyn AdapterCatalog>,
        config: &ClientConfig,
    ) -> Result<Self, HttpClientError> {
        let resolver = DoiOrgResolver::from_config(config)?;
        Ok(Self {
            catalog,
            resolver: Arc::new(resolver),
            warnings: Arc::new(TracingWarnings),
            group: config.catalog_group.clone(),
            issue_tracker: config.issue_tracker.clone(),
        })
    }

    /// Overrides the catalog group enumerated at dispatch time.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Loads and orders the factories currently registered in the catalog.
    ///
    /// Factories whose claim needs no network come first; ties keep catalog
    /// order. Entries that fail to load are reported and skipped.
    #[must_use]
    pub fn available_factories(&self) -> Vec<Arc<dyn AdapterFactory>> {
        let mut factories: Vec<Arc<dyn AdapterFactory>> = Vec::new();
        for loader in self.catalog.entries(&self.group) {
            match loader.load() {
                Ok(factory) => factories.push(factory),
                Err(error) => self.warnings.warn(&DispatchWarning::LoaderFailed {
                    entry: loader.entry_name().to_string(),
                    error: error.to_string(),
                }),
            }
        }
        // sort_by_key is stable, so registration order breaks ties
        factories.sort_by_key(|factory| factory.info().init_requires_network);
        factories
    }

    /// Selects the adapter owning `doi`.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieveError::RepositoryNotFound`] or
    /// [`RetrieveError::ResolutionFailed`] if the DOI cannot be resolved, and
    /// [`RetrieveError::UnsupportedRepository`] if no adapter claims the URL.
    /// Individual adapter faults never surface here.
    #[tracing::instrument(skip(self, doi), fields(doi = %doi, group = %self.group))]
    pub async fn dispatch(&self, doi: &Doi) -> Result<SelectedAdapter, RetrieveError> {
        let factories = self.available_factories();
        debug!(candidates = factories.len(), "Loaded repository adapters");

        let resolved = self.resolver.resolve(doi).await?;

        for factory in &factories {
            let info = factory.info();
            debug!(adapter = %info.name, url = %resolved.url, "Probing adapter");

            let outcome = AssertUnwindSafe(factory.claim(doi, &resolved))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(Claim::Claimed(adapter))) => {
                    info!(adapter = %info.name, url = %resolved.url, "Repository adapter selected");
                    if let Some(message) = info.active_user_warning() {
                        self.warnings.warn(&DispatchWarning::UserWarning {
                            adapter: info.name.clone(),
                            message: message.to_string(),
                        });
                    }
                    return Ok(SelectedAdapter {
                        info: info.clone(),
                        doi: doi.clone(),
                        resolved,
                        adapter,
                    });
                }
                Ok(Ok(Claim::NotMine)) => {
                    debug!(adapter = %info.name, "Adapter declined URL");
                }
                Ok(Err(error)) => self.report_fault(info, error.to_string()),
                Err(payload) => self.report_fault(info, panic_message(payload.as_ref())),
            }
        }

        Err(RetrieveError::unsupported_repository(
            resolved.host(),
            resolved.as_str(),
            &self.issue_tracker,
        ))
    }
}

impl Dispatcher {
    fn report_fault(&self, info: &AdapterInfo, error: String) {
        self.warnings.warn(&DispatchWarning::AdapterFailed {
            adapter: info.name.clone(),
            error,
            issue_tracker: info.issue_tracker.clone(),
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("panicked: {detail}")
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("group", &self.group)
            .field("issue_tracker", &self.issue_tracker)
            .finish_non_exhaustive()
    }
}
