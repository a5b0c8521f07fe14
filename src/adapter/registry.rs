//! File registry: file name to expected content hash.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{AdapterError, RetrieveError};

/// Immutable mapping from file name to content hash.
///
/// Every entry carries a non-empty hash; construction fails otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "HashMap<String, String>")]
pub struct FileRegistry {
    entries: HashMap<String, String>,
}

impl FileRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from `(file name, hash)` pairs.
    ///
    /// Later duplicates replace earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::EmptyHash`] for the first entry with a blank hash.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, AdapterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = HashMap::new();
        for (file_name, hash) in entries {
            let file_name = file_name.into();
            let hash = hash.into();
            if hash.trim().is_empty() {
                return Err(AdapterError::EmptyHash { file_name });
            }
            map.insert(file_name, hash);
        }
        Ok(Self { entries: map })
    }

    /// Returns the hash recorded for `file_name`.
    #[must_use]
    pub fn hash_for(&self, file_name: &str) -> Option<&str> {
        self.entries.get(file_name).map(String::as_str)
    }

    /// Returns the hash for `file_name`, or `FileNotInRegistry` naming `doi`.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieveError::FileNotInRegistry`] when `file_name` is absent.
    pub fn require_hash(&self, file_name: &str, doi: &str) -> Result<&str, RetrieveError> {
        self.hash_for(file_name)
            .ok_or_else(|| RetrieveError::file_not_in_registry(file_name, doi))
    }

    /// Returns true if `file_name` is registered.
    #[must_use]
    pub fn contains(&self, file_name: &str) -> bool {
        self.entries.contains_key(file_name)
    }

    /// Number of registered files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no files are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered file names, sorted for stable output.
    #[must_use]
    pub fn file_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Iterates over `(file name, hash)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl TryFrom<HashMap<String, String>> for FileRegistry {
    type Error = AdapterError;

    fn try_from(entries: HashMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_entries(entries)
    }
}
