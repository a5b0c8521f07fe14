//! Repository adapter contract.
//!
//! A repository integration is split in two halves:
//!
//! - [`AdapterFactory`] - the stateless, registered half. It carries static
//!   metadata ([`AdapterInfo`]) and decides whether a resolved URL belongs to
//!   its repository ([`AdapterFactory::claim`]).
//! - [`RepositoryAdapter`] - the per-request instance produced by a
//!   successful claim. It maps file names to download URLs and lists the
//!   archive's files with their hashes.
//!
//! # Object Safety
//!
//! Both traits use `async_trait` so the dispatch engine can hold them as
//! `Arc<dyn AdapterFactory>` / `Box<dyn RepositoryAdapter>`.

mod catalog;
mod registry;

pub use catalog::{AdapterCatalog, AdapterLoader, FactoryLoader, StaticCatalog};
pub use registry::FileRegistry;

use async_trait::async_trait;

use crate::doi::Doi;
use crate::error::AdapterError;
use crate::resolver::ResolvedUrl;

/// Static metadata describing a repository integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    /// Display name of the repository.
    pub name: String,
    /// Homepage of the service, or of the project for self-hostable repositories.
    pub homepage: String,
    /// Where problems with this integration should be reported.
    pub issue_tracker: Option<String>,
    /// Whether the repository software can be self-hosted.
    pub allows_self_hosting: bool,
    /// Whether all public data of the repository is reachable through this adapter.
    pub full_support: bool,
    /// Message shown to the user whenever this adapter is selected.
    pub user_warning: Option<String>,
    /// Whether `claim` performs network requests; used only for probe ordering.
    pub init_requires_network: bool,
}

impl AdapterInfo {
    /// Creates metadata with default capability flags.
    #[must_use]
    pub fn new(name: impl Into<String>, homepage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            homepage: homepage.into(),
            issue_tracker: None,
            allows_self_hosting: false,
            full_support: true,
            user_warning: None,
            init_requires_network: true,
        }
    }

    /// Sets the issue tracker URL.
    #[must_use]
    pub fn with_issue_tracker(mut self, issue_tracker: impl Into<String>) -> Self {
        self.issue_tracker = Some(issue_tracker.into());
        self
    }

    /// Sets the self-hosting flag.
    #[must_use]
    pub fn with_self_hosting(mut self, allows_self_hosting: bool) -> Self {
        self.allows_self_hosting = allows_self_hosting;
        self
    }

    /// Sets the full-support flag.
    #[must_use]
    pub fn with_full_support(mut self, full_support: bool) -> Self {
        self.full_support = full_support;
        self
    }

    /// Sets the user warning.
    #[must_use]
    pub fn with_user_warning(mut self, user_warning: impl Into<String>) -> Self {
        self.user_warning = Some(user_warning.into());
        self
    }

    /// Declares whether `claim` needs the network.
    #[must_use]
    pub fn with_init_requires_network(mut self, init_requires_network: bool) -> Self {
        self.init_requires_network = init_requires_network;
        self
    }

    /// Returns the user warning when it is present and non-blank.
    #[must_use]
    pub fn active_user_warning(&self) -> Option<&str> {
        self.user_warning
            .as_deref()
            .filter(|warning| !warning.trim().is_empty())
    }
}

/// Outcome of probing a resolved URL.
pub enum Claim {
    /// The factory recognised the URL and produced a ready adapter.
    Claimed(Box<dyn RepositoryAdapter>),
    /// The URL belongs to some other repository.
    NotMine,
}

impl Claim {
    /// Returns true for [`Claim::Claimed`].
    #[must_use]
    pub fn is_claimed(&self) -> bool {
        matches!(self, Self::Claimed(_))
    }
}

impl std::fmt::Debug for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Claimed(_) => f.write_str("Claimed(..)"),
            Self::NotMine => f.write_str("NotMine"),
        }
    }
}

/// The registered, stateless half of a repository integration.
#[async_trait]
pub trait AdapterFactory: Send + Sync {
    /// Static metadata for this repository.
    fn info(&self) -> &AdapterInfo;

    /// Decides whether `resolved` belongs to this repository.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] only for genuine internal faults such as a
    /// failed probing request or an uninterpretable response. Foreign URLs
    /// yield `Ok(Claim::NotMine)`.
    async fn claim(&self, doi: &Doi, resolved: &ResolvedUrl) -> Result<Claim, AdapterError>;
}

/// A repository adapter bound to one archive.
#[async_trait]
pub trait RepositoryAdapter: Send + Sync {
    /// Returns the HTTP location of `file_name` within this archive.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when the repository lookup fails.
    async fn download_url(&self, file_name: &str) -> Result<String, AdapterError>;

    /// Lists every file of the archive with its published content hash.
    ///
    /// Returns a fresh registry on each call; may be slow.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when the listing fails.
    async fn create_registry(&self) -> Result<FileRegistry, AdapterError>;
}
