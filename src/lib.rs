//! DOI Dispatch Library
//!
//! This library turns a Digital Object Identifier into a downloadable file:
//! it follows the `doi.org` redirect to the hosting data repository, selects
//! the repository adapter that claims the landing URL, and hands the final
//! download URL and content hash to an external fetcher.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`doi`] - DOI validation and decomposition
//! - [`resolver`] - DOI to landing URL resolution
//! - [`adapter`] - Repository adapter contract and plugin catalog
//! - [`dispatch`] - Adapter selection over the catalog
//! - [`retrieve`] - Retrieval facade and fetch collaborator contract
//! - [`archive`] - Registry-backed archive handle
//! - [`config`] - Client configuration
//! - [`error`] - Error types

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod archive;
pub mod config;
pub mod dispatch;
pub mod doi;
pub mod error;
pub mod resolver;
pub mod retrieve;
#[cfg(test)]
pub(crate) mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use adapter::{
    AdapterCatalog, AdapterFactory, AdapterInfo, AdapterLoader, Claim, FactoryLoader,
    FileRegistry, RepositoryAdapter, StaticCatalog,
};
pub use archive::DoiArchive;
pub use config::{ClientConfig, ConfigError, DATA_REPOSITORIES_GROUP};
pub use dispatch::{DispatchWarning, Dispatcher, SelectedAdapter, TracingWarnings, WarningSink};
pub use doi::{Doi, DoiParts, is_valid_doi, parse_doi, validate};
pub use error::{AdapterError, FetchError, PROJECT_ISSUE_TRACKER, RetrieveError};
pub use resolver::{DoiLookup, DoiOrgResolver, ResolvedUrl};
pub use retrieve::{
    DoiRetriever, Downloader, FetchRequest, Fetcher, Processor, RetrieveRequest,
};
