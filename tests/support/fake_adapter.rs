//! Configurable test doubles for the dispatch and retrieval pipeline.
//!
//! [`FakeAdapter`] builds an [`AdapterFactory`] whose behaviour is composed
//! from defaults plus per-method strategies: a fixed value, a fixed error, or
//! a closure.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use doi_dispatch::{
    AdapterError, AdapterFactory, AdapterInfo, Claim, DispatchWarning, Doi, DoiLookup,
    FetchError, FetchRequest, Fetcher, FileRegistry, RepositoryAdapter, ResolvedUrl,
    RetrieveError, WarningSink,
};
use url::Url;

type ClaimFn = dyn Fn(&Doi, &ResolvedUrl) -> Result<bool, AdapterError> + Send + Sync;
type DownloadFn = dyn Fn(&str) -> Result<String, AdapterError> + Send + Sync;
type RegistryFn = dyn Fn() -> Result<FileRegistry, AdapterError> + Send + Sync;

/// Shared, ordered log of adapter names probed by `claim`.
pub type ProbeLog = Arc<Mutex<Vec<String>>>;

pub fn probe_log() -> ProbeLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Builder for a fake repository adapter factory.
pub struct FakeAdapter {
    info: AdapterInfo,
    claim: Arc<ClaimFn>,
    download_url: Arc<DownloadFn>,
    registry: Arc<RegistryFn>,
    probes: Option<ProbeLog>,
}

impl FakeAdapter {
    /// Never claims; serves `{homepage}/files/{name}` and an empty registry.
    pub fn new(name: &str) -> Self {
        let homepage = format!("https://{}.example", name.to_ascii_lowercase());
        let files_base = homepage.clone();
        Self {
            info: AdapterInfo::new(name, homepage),
            claim: Arc::new(|_, _| Ok(false)),
            download_url: Arc::new(move |file_name| Ok(format!("{files_base}/files/{file_name}"))),
            registry: Arc::new(|| Ok(FileRegistry::new())),
            probes: None,
        }
    }

    pub fn info(mut self, configure: impl FnOnce(AdapterInfo) -> AdapterInfo) -> Self {
        self.info = configure(self.info);
        self
    }

    pub fn init_requires_network(self, value: bool) -> Self {
        self.info(|info| info.with_init_requires_network(value))
    }

    /// Claims every URL whose host equals `host`.
    pub fn claims_host(mut self, host: &str) -> Self {
        let host = host.to_string();
        self.claim = Arc::new(move |_, resolved| Ok(resolved.host() == host));
        self
    }

    pub fn claims_all(mut self) -> Self {
        self.claim = Arc::new(|_, _| Ok(true));
        self
    }

    pub fn claim_error(mut self, error: AdapterError) -> Self {
        self.claim = Arc::new(move |_, _| Err(error.clone()));
        self
    }

    pub fn claim_with<F>(mut self, claim: F) -> Self
    where
        F: Fn(&Doi, &ResolvedUrl) -> Result<bool, AdapterError> + Send + Sync + 'static,
    {
        self.claim = Arc::new(claim);
        self
    }

    pub fn download_url(mut self, url: &str) -> Self {
        let url = url.to_string();
        self.download_url = Arc::new(move |_| Ok(url.clone()));
        self
    }

    pub fn download_url_error(mut self, error: AdapterError) -> Self {
        self.download_url = Arc::new(move |_| Err(error.clone()));
        self
    }

    pub fn download_url_with<F>(mut self, download_url: F) -> Self
    where
        F: Fn(&str) -> Result<String, AdapterError> + Send + Sync + 'static,
    {
        self.download_url = Arc::new(download_url);
        self
    }

    pub fn registry(mut self, entries: &[(&str, &str)]) -> Self {
        let entries: Vec<(String, String)> = entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        self.registry = Arc::new(move || FileRegistry::from_entries(entries.clone()));
        self
    }

    pub fn registry_error(mut self, error: AdapterError) -> Self {
        self.registry = Arc::new(move || Err(error.clone()));
        self
    }

    pub fn record_probes(mut self, log: &ProbeLog) -> Self {
        self.probes = Some(Arc::clone(log));
        self
    }

    pub fn build(self) -> Arc<dyn AdapterFactory> {
        Arc::new(FakeFactory {
            info: self.info,
            claim: self.claim,
            download_url: self.download_url,
            registry: self.registry,
            probes: self.probes,
        })
    }
}

struct FakeFactory {
    info: AdapterInfo,
    claim: Arc<ClaimFn>,
    download_url: Arc<DownloadFn>,
    registry: Arc<RegistryFn>,
    probes: Option<ProbeLog>,
}

#[async_trait]
impl AdapterFactory for FakeFactory {
    fn info(&self) -> &AdapterInfo {
        &self.info
    }

    async fn claim(&self, doi: &Doi, resolved: &ResolvedUrl) -> Result<Claim, AdapterError> {
        if let Some(log) = &self.probes {
            log.lock().unwrap().push(self.info.name.clone());
        }
        if (self.claim)(doi, resolved)? {
            Ok(Claim::Claimed(Box::new(FakeRecord {
                download_url: Arc::clone(&self.download_url),
                registry: Arc::clone(&self.registry),
            })))
        } else {
            Ok(Claim::NotMine)
        }
    }
}

struct FakeRecord {
    download_url: Arc<DownloadFn>,
    registry: Arc<RegistryFn>,
}

#[async_trait]
impl RepositoryAdapter for FakeRecord {
    async fn download_url(&self, file_name: &str) -> Result<String, AdapterError> {
        (self.download_url)(file_name)
    }

    async fn create_registry(&self) -> Result<FileRegistry, AdapterError> {
        (self.registry)()
    }
}

/// DOI lookup answering with a fixed URL or error, counting calls.
pub struct StaticLookup {
    outcome: Result<(String, u16), (String, u16)>,
    calls: AtomicUsize,
}

impl StaticLookup {
    pub fn resolving_to(url: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok((url.to_string(), 200)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn not_found(url: &str, status: u16) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err((url.to_string(), status)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DoiLookup for StaticLookup {
    async fn resolve(&self, doi: &Doi) -> Result<ResolvedUrl, RetrieveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok((url, status)) => Ok(ResolvedUrl::new(Url::parse(url).unwrap(), *status)),
            Err((url, status)) => Err(RetrieveError::repository_not_found(
                doi.as_str(),
                url,
                *status,
            )),
        }
    }
}

/// Fetcher that records every request and answers with `{path or /cache}/{file}`.
#[derive(Default)]
pub struct RecordingFetcher {
    requests: Mutex<Vec<FetchRequest>>,
}

impl RecordingFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for RecordingFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<PathBuf, FetchError> {
        let dir = request
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("/cache"));
        let target = dir.join(&request.file_name);
        self.requests.lock().unwrap().push(request);
        Ok(target)
    }
}

/// Warning sink keeping every warning in emission order.
#[derive(Default)]
pub struct RecordingWarnings {
    warnings: Mutex<Vec<DispatchWarning>>,
}

impl RecordingWarnings {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn warnings(&self) -> Vec<DispatchWarning> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.warnings().iter().map(ToString::to_string).collect()
    }
}

impl WarningSink for RecordingWarnings {
    fn warn(&self, warning: &DispatchWarning) {
        self.warnings.lock().unwrap().push(warning.clone());
    }
}
