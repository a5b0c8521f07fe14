//! Error types for DOI retrieval.
//!
//! This module defines structured errors for validation, resolution,
//! dispatch and retrieval, following the What/Why/Fix message layout.

use thiserror::Error;

/// Issue tracker used when no adapter supports a repository.
pub const PROJECT_ISSUE_TRACKER: &str = "https://github.com/ssciwr/pooch-doi/issues";

/// Errors surfaced to callers of the retrieval pipeline.
#[derive(Debug, Error)]
pub enum RetrieveError {
    /// DOI failed syntactic validation
    #[error("invalid DOI '{doi}': {reason}\n  Suggestion: {suggestion}")]
    InvalidDoi {
        /// The rejected input
        doi: String,
        /// Why the DOI is invalid
        reason: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// The DOI resolution endpoint answered with an error status
    #[error(
        "archive with doi:{doi} not found (HTTP {status} at {url})\n  Suggestion: Is the DOI correct?"
    )]
    RepositoryNotFound {
        /// The DOI being resolved
        doi: String,
        /// The URL that answered with the error status
        url: String,
        /// Terminal HTTP status code
        status: u16,
    },

    /// The DOI resolution endpoint could not be reached
    #[error("resolution failed for doi:{doi}: {reason}\n  Suggestion: Check your network connection and try again")]
    ResolutionFailed {
        /// The DOI being resolved
        doi: String,
        /// Transport-level failure description
        reason: String,
    },

    /// A repository adapter failed while evaluating or serving a request
    #[error("repository '{adapter}' failed: {source}{}", issue_hint(.issue_tracker.as_deref()))]
    AdapterFault {
        /// Display name of the failing adapter
        adapter: String,
        /// Adapter issue tracker, when declared
        issue_tracker: Option<String>,
        /// The adapter-side failure
        #[source]
        source: AdapterError,
    },

    /// No registered adapter claims the resolved URL
    #[error(
        "invalid data repository '{host}' (resolved from {url})\n  Suggestion: To request or contribute support for this repository, please open an issue at {issue_tracker}"
    )]
    UnsupportedRepository {
        /// Host of the resolved URL
        host: String,
        /// The full resolved URL
        url: String,
        /// Where support can be requested
        issue_tracker: String,
    },

    /// The selected adapter's registry has no entry for the requested file
    #[error(
        "file '{file_name}' is not in the registry of doi:{doi}\n  Suggestion: Check the file name against the files published in the archive"
    )]
    FileNotInRegistry {
        /// The requested file name
        file_name: String,
        /// The DOI whose registry was consulted
        doi: String,
    },

    /// Availability probing is not offered for DOI archives
    #[error("availability checks are not supported for DOI archives (file '{file_name}')")]
    AvailabilityUnsupported {
        /// The file whose availability was requested
        file_name: String,
    },

    /// The fetch collaborator failed
    #[error("fetching {url} failed: {source}")]
    Fetch {
        /// Download URL handed to the fetcher
        url: String,
        /// The fetcher's error
        #[source]
        source: FetchError,
    },
}

fn issue_hint(issue_tracker: Option<&str>) -> String {
    issue_tracker
        .map(|tracker| format!("\n  Suggestion: Please open an issue at {tracker}"))
        .unwrap_or_default()
}

impl RetrieveError {
    /// Creates an `InvalidDoi` error with the default suggestion.
    #[must_use]
    pub fn invalid_doi(doi: &str, reason: &str) -> Self {
        Self::InvalidDoi {
            doi: doi.to_string(),
            reason: reason.to_string(),
            suggestion: "Use the form 10.XXXX/suffix, optionally prefixed with 'doi:'".to_string(),
        }
    }

    /// Creates an `InvalidDoi` error for `doi://` style input.
    #[must_use]
    pub fn doi_protocol_separator(doi: &str) -> Self {
        Self::InvalidDoi {
            doi: doi.to_string(),
            reason: "'//' must not follow 'doi:'".to_string(),
            suggestion: "Write the DOI as doi:10.XXXX/suffix".to_string(),
        }
    }

    /// Creates a `RepositoryNotFound` error.
    #[must_use]
    pub fn repository_not_found(doi: &str, url: &str, status: u16) -> Self {
        Self::RepositoryNotFound {
            doi: doi.to_string(),
            url: url.to_string(),
            status,
        }
    }

    /// Creates a `ResolutionFailed` error.
    #[must_use]
    pub fn resolution_failed(doi: &str, reason: &str) -> Self {
        Self::ResolutionFailed {
            doi: doi.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates an `AdapterFault` error.
    #[must_use]
    pub fn adapter_fault(adapter: &str, issue_tracker: Option<&str>, source: AdapterError) -> Self {
        Self::AdapterFault {
            adapter: adapter.to_string(),
            issue_tracker: issue_tracker.map(ToString::to_string),
            source,
        }
    }

    /// Creates an `UnsupportedRepository` error.
    #[must_use]
    pub fn unsupported_repository(host: &str, url: &str, issue_tracker: &str) -> Self {
        Self::UnsupportedRepository {
            host: host.to_string(),
            url: url.to_string(),
            issue_tracker: issue_tracker.to_string(),
        }
    }

    /// Creates a `FileNotInRegistry` error.
    #[must_use]
    pub fn file_not_in_registry(file_name: &str, doi: &str) -> Self {
        Self::FileNotInRegistry {
            file_name: file_name.to_string(),
            doi: doi.to_string(),
        }
    }

    /// Creates a `Fetch` error.
    #[must_use]
    pub fn fetch(url: &str, source: FetchError) -> Self {
        Self::Fetch {
            url: url.to_string(),
            source,
        }
    }
}

/// Failures raised by repository adapters.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// A request issued by the adapter failed
    #[error("request to {url} failed: {reason}")]
    Request {
        /// The URL the adapter requested
        url: String,
        /// Why the request failed
        reason: String,
    },

    /// The repository answered with something the adapter could not interpret
    #[error("unexpected response from {url}: {reason}")]
    MalformedResponse {
        /// The URL whose response was malformed
        url: String,
        /// What was wrong with it
        reason: String,
    },

    /// A registry entry was produced without a content hash
    #[error("registry entry '{file_name}' has an empty hash")]
    EmptyHash {
        /// The file whose hash is missing
        file_name: String,
    },

    /// A catalog entry could not be loaded
    #[error("failed to load catalog entry '{entry}': {reason}")]
    Load {
        /// Catalog entry name
        entry: String,
        /// Why loading failed
        reason: String,
    },

    /// Any other adapter-internal fault
    #[error("{0}")]
    Other(String),
}

impl AdapterError {
    /// Creates a `Request` error.
    #[must_use]
    pub fn request(url: &str, reason: impl Into<String>) -> Self {
        Self::Request {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a `MalformedResponse` error.
    #[must_use]
    pub fn malformed_response(url: &str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a `Load` error.
    #[must_use]
    pub fn load(entry: &str, reason: impl Into<String>) -> Self {
        Self::Load {
            entry: entry.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(error: reqwest::Error) -> Self {
        let url = error
            .url()
            .map(ToString::to_string)
            .unwrap_or_else(|| "<unknown>".to_string());
        Self::Request {
            url,
            reason: error.to_string(),
        }
    }
}

/// Failures reported by the fetch collaborator.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transfer of the file failed
    #[error("download failed: {0}")]
    Download(String),

    /// Downloaded content did not match the expected hash
    #[error("hash mismatch for '{file_name}': expected {expected}, got {actual}")]
    HashMismatch {
        /// File that failed verification
        file_name: String,
        /// Hash the caller expected
        expected: String,
        /// Hash of the downloaded content
        actual: String,
    },

    /// Post-processing of the downloaded file failed
    #[error("processing failed: {0}")]
    Processor(String),

    /// Local filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
