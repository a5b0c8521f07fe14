//! Integration tests for the retrieval facade and archive handle.
//!
//! The fetch collaborator is a recording double; no file transfer happens.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use doi_dispatch::{
    AdapterError, DATA_REPOSITORIES_GROUP, Dispatcher, DoiArchive, DoiRetriever, FetchError,
    Processor, RetrieveError, RetrieveRequest, StaticCatalog,
};
use tempfile::TempDir;

mod support;
use support::fake_adapter::{FakeAdapter, RecordingFetcher, RecordingWarnings, StaticLookup};

const ZENODO_DOI: &str = "10.5281/zenodo.17544720";
const ZENODO_LANDING: &str = "https://zenodo.org/doi/10.5281/zenodo.17544720";
const DOWNLOAD_URL: &str = "https://zenodo.org/records/17544720/files/result_values";

struct Pipeline {
    lookup: Arc<StaticLookup>,
    fetcher: Arc<RecordingFetcher>,
    retriever: Arc<DoiRetriever>,
}

fn pipeline(adapter: FakeAdapter) -> Pipeline {
    let catalog = Arc::new(StaticCatalog::new());
    catalog.register_factory(DATA_REPOSITORIES_GROUP, "zenodo", adapter.build());
    let lookup = StaticLookup::resolving_to(ZENODO_LANDING);
    let fetcher = RecordingFetcher::new();
    let dispatcher = Dispatcher::new(catalog, lookup.clone(), RecordingWarnings::new());
    Pipeline {
        lookup,
        fetcher: fetcher.clone(),
        retriever: Arc::new(DoiRetriever::new(dispatcher, fetcher)),
    }
}

fn zenodo() -> FakeAdapter {
    FakeAdapter::new("Zenodo")
        .claims_host("zenodo.org")
        .download_url(DOWNLOAD_URL)
}

#[tokio::test]
async fn test_end_to_end_with_known_hash() {
    let p = pipeline(zenodo());

    let path = p
        .retriever
        .retrieve_from_doi(RetrieveRequest::new(ZENODO_DOI, "result_values").known_hash("hash"))
        .await
        .unwrap();

    assert_eq!(path, PathBuf::from("/cache/result_values"));
    let requests = p.fetcher.requests();
    assert_eq!(requests.len(), 1, "fetcher must be called exactly once");
    let request = &requests[0];
    assert_eq!(request.url, DOWNLOAD_URL);
    assert_eq!(request.known_hash, "hash");
    assert_eq!(request.file_name, "result_values");
    assert!(request.path.is_none());
    assert!(request.processor.is_none());
    assert!(request.downloader.is_none());
    assert!(!request.progress);
}

#[tokio::test]
async fn test_missing_hash_resolved_from_registry() {
    let p = pipeline(zenodo().registry(&[("result_values", "abc123")]));

    p.retriever
        .retrieve_from_doi(RetrieveRequest::new(ZENODO_DOI, "result_values"))
        .await
        .unwrap();

    assert_eq!(p.fetcher.requests()[0].known_hash, "abc123");
}

#[tokio::test]
async fn test_file_absent_from_registry_never_fetches() {
    let p = pipeline(zenodo().registry(&[("result_values", "abc123")]));

    let err = p
        .retriever
        .retrieve_from_doi(RetrieveRequest::new(ZENODO_DOI, "other_values"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RetrieveError::FileNotInRegistry { ref file_name, ref doi }
            if file_name == "other_values" && doi == ZENODO_DOI
    ));
    assert!(p.fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_invalid_doi_fails_before_network() {
    let p = pipeline(zenodo());

    for doi in ["doi://10.5281/zenodo.1", "11.5281/zenodo.17544720", "10.60/x"] {
        let err = p
            .retriever
            .retrieve_from_doi(RetrieveRequest::new(doi, "result_values"))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrieveError::InvalidDoi { .. }), "{doi}: {err:?}");
    }
    assert_eq!(p.lookup.calls(), 0);
    assert!(p.fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_unsupported_repository_never_fetches() {
    let p = pipeline(FakeAdapter::new("Figshare").claims_host("figshare.com"));

    let err = p
        .retriever
        .retrieve_from_doi(RetrieveRequest::new(ZENODO_DOI, "result_values").known_hash("hash"))
        .await
        .unwrap_err();

    assert!(matches!(err, RetrieveError::UnsupportedRepository { .. }));
    assert!(p.fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_download_url_failure_surfaces_as_adapter_fault() {
    let p = pipeline(
        FakeAdapter::new("Zenodo")
            .claims_host("zenodo.org")
            .info(|info| info.with_issue_tracker("https://zenodo.example/issues"))
            .download_url_error(AdapterError::malformed_response(
                "https://zenodo.org/api/records/17544720",
                "missing 'files' key",
            )),
    );

    let err = p
        .retriever
        .retrieve_from_doi(RetrieveRequest::new(ZENODO_DOI, "result_values").known_hash("hash"))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(matches!(err, RetrieveError::AdapterFault { .. }));
    assert!(message.contains("missing 'files' key"), "got: {message}");
    assert!(message.contains("https://zenodo.example/issues"), "got: {message}");
    assert!(p.fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_download_url_receives_file_name() {
    let p = pipeline(
        FakeAdapter::new("Zenodo")
            .claims_host("zenodo.org")
            .download_url_with(|file_name| {
                Ok(format!("https://zenodo.org/api/records/17544720/files/{file_name}/content"))
            }),
    );

    p.retriever
        .retrieve_from_doi(RetrieveRequest::new(ZENODO_DOI, "table.csv").known_hash("hash"))
        .await
        .unwrap();

    assert_eq!(
        p.fetcher.requests()[0].url,
        "https://zenodo.org/api/records/17544720/files/table.csv/content"
    );
}

#[derive(Debug)]
struct Unzip;

impl Processor for Unzip {
    fn process(&self, path: &Path) -> Result<PathBuf, FetchError> {
        Ok(path.with_extension(""))
    }
}

#[tokio::test]
async fn test_processor_is_forwarded_to_fetcher() {
    let p = pipeline(zenodo());

    p.retriever
        .retrieve_from_doi(
            RetrieveRequest::new(ZENODO_DOI, "result_values")
                .known_hash("hash")
                .processor(Arc::new(Unzip))
                .progress(true),
        )
        .await
        .unwrap();

    let requests = p.fetcher.requests();
    let request = &requests[0];
    assert!(request.processor.is_some());
    assert!(request.progress);
}

#[tokio::test]
async fn test_archive_fetch_into_directory() {
    let temp_dir = TempDir::new().unwrap();
    let p = pipeline(zenodo().registry(&[("result_values", "md5:f00")]));

    let archive = DoiArchive::open(p.retriever.clone(), temp_dir.path(), ZENODO_DOI, true)
        .await
        .unwrap();
    assert_eq!(archive.registry().len(), 1);

    let path = archive.fetch("result_values", None, None, false).await.unwrap();
    assert_eq!(path, temp_dir.path().join("result_values"));

    let requests = p.fetcher.requests();
    let request = &requests[0];
    assert_eq!(request.known_hash, "md5:f00");
    assert_eq!(request.path.as_deref(), Some(temp_dir.path()));
}

#[tokio::test]
async fn test_archive_registry_failure_propagates() {
    let p = pipeline(zenodo().registry_error(AdapterError::request(
        "https://zenodo.org/api/records/17544720",
        "connection reset",
    )));

    let err = DoiArchive::open(p.retriever.clone(), "/tmp/cache", ZENODO_DOI, true)
        .await
        .unwrap_err();
    assert!(matches!(err, RetrieveError::AdapterFault { .. }));
}

#[tokio::test]
async fn test_archive_reload_replaces_registry() {
    let p = pipeline(zenodo().registry(&[("a.csv", "md5:1"), ("b.csv", "md5:2")]));
    let mut archive = DoiArchive::new(p.retriever.clone(), "/tmp/cache", ZENODO_DOI).unwrap();
    assert!(archive.registry().is_empty());

    let count = archive.load_registry_from_doi().await.unwrap();
    assert_eq!(count, 2);
    assert_eq!(archive.registry().file_names(), vec!["a.csv", "b.csv"]);
}

#[derive(Debug)]
struct NoopDownloader;

#[async_trait]
impl doi_dispatch::Downloader for NoopDownloader {
    async fn download(&self, _url: &str, _output: &Path) -> Result<(), FetchError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_archive_fetch_forwards_downloader() {
    let p = pipeline(zenodo().registry(&[("result_values", "md5:f00")]));
    let archive = DoiArchive::open(p.retriever.clone(), "/tmp/cache", ZENODO_DOI, true)
        .await
        .unwrap();

    archive
        .fetch("result_values", None, Some(Arc::new(NoopDownloader)), true)
        .await
        .unwrap();

    let requests = p.fetcher.requests();
    let request = &requests[0];
    assert!(request.downloader.is_some());
    assert!(request.progress);
}
