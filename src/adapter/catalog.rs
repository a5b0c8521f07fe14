//! Adapter catalog: the plugin registry consulted at dispatch time.
//!
//! The catalog is a name-to-loader listing grouped under well-known group
//! names. The dispatch engine reads it on every call and never caches the
//! loaded factories, so registrations take effect on the next dispatch.

use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::error::AdapterError;

use super::AdapterFactory;

/// A catalog entry that can produce an adapter factory on demand.
pub trait AdapterLoader: Send + Sync {
    /// The entry name under which the loader was registered.
    fn entry_name(&self) -> &str;

    /// Loads the factory.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Load`] when the factory cannot be produced.
    fn load(&self) -> Result<Arc<dyn AdapterFactory>, AdapterError>;
}

/// Enumerable collection of adapter loaders.
pub trait AdapterCatalog: Send + Sync {
    /// Returns every loader registered under `group`, in registration order.
    fn entries(&self, group: &str) -> Vec<Arc<dyn AdapterLoader>>;
}

type LoadFn = dyn Fn() -> Result<Arc<dyn AdapterFactory>, AdapterError> + Send + Sync;

/// Loader backed by an already-built factory or a closure.
pub struct FactoryLoader {
    name: String,
    load_fn: Box<LoadFn>,
}

impl FactoryLoader {
    /// Creates a loader that always yields `factory`.
    #[must_use]
    pub fn new(name: impl Into<String>, factory: Arc<dyn AdapterFactory>) -> Self {
        Self {
            name: name.into(),
            load_fn: Box::new(move || Ok(Arc::clone(&factory))),
        }
    }

    /// Creates a loader that runs `load_fn` on every load.
    #[must_use]
    pub fn from_fn<F>(name: impl Into<String>, load_fn: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn AdapterFactory>, AdapterError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            load_fn: Box::new(load_fn),
        }
    }
}

impl AdapterLoader for FactoryLoader {
    fn entry_name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Arc<dyn AdapterFactory>, AdapterError> {
        (self.load_fn)()
    }
}

impl std::fmt::Debug for FactoryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryLoader")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

struct CatalogEntry {
    group: String,
    loader: Arc<dyn AdapterLoader>,
}

/// Explicit, in-process registration list.
///
/// Registration and removal are allowed at any time; the dispatch engine
/// observes the current contents on its next call.
#[derive(Default)]
pub struct StaticCatalog {
    entries: RwLock<Vec<CatalogEntry>>,
}

impl StaticCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `loader` under `group`.
    #[tracing::instrument(skip(self, loader), fields(entry = loader.entry_name()))]
    pub fn register(&self, group: &str, loader: Arc<dyn AdapterLoader>) {
        debug!(group, "Registering catalog entry");
        self.write_entries().push(CatalogEntry {
            group: group.to_string(),
            loader,
        });
    }

    /// Registers an already-built factory under `group` with entry name `name`.
    pub fn register_factory(&self, group: &str, name: &str, factory: Arc<dyn AdapterFactory>) {
        self.register(group, Arc::new(FactoryLoader::new(name, factory)));
    }

    /// Removes every entry called `name` from `group`; returns how many were removed.
    pub fn unregister(&self, group: &str, name: &str) -> usize {
        let mut entries = self.write_entries();
        let before = entries.len();
        entries.retain(|entry| !(entry.group == group && entry.loader.entry_name() == name));
        before - entries.len()
    }

    /// Removes every entry from `group`.
    pub fn clear_group(&self, group: &str) {
        self.write_entries().retain(|entry| entry.group != group);
    }

    /// Total number of entries across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    /// Returns true if no entries are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, Vec<CatalogEntry>> {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write_entries(&self) -> std::sync::RwLockWriteGuard<'_, Vec<CatalogEntry>> {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl AdapterCatalog for StaticCatalog {
    fn entries(&self, group: &str) -> Vec<Arc<dyn AdapterLoader>> {
        self.read_entries()
            .iter()
            .filter(|entry| entry.group == group)
            .map(|entry| Arc::clone(&entry.loader))
            .collect()
    }
}

impl std::fmt::Debug for StaticCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.read_entries();
        let names: Vec<String> = entries
            .iter()
            .map(|entry| format!("{}:{}", entry.group, entry.loader.entry_name()))
            .collect();
        f.debug_struct("StaticCatalog")
            .field("entry_count", &entries.len())
            .field("entries", &names)
            .finish()
    }
}
