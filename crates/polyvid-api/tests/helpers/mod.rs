//! Shared test fixtures: in-memory backends and a fetch-counting storage
//! wrapper for cache behavior assertions.

use async_trait::async_trait;
use bytes::Bytes;
use polyvid_api::cache::ProxyCache;
use polyvid_api::state::AppState;
use polyvid_api::upload_status::UploadStatusMap;
use polyvid_core::{Config, StorageBackend};
use polyvid_metastore::{MemoryMetadataStore, MetadataStore};
use polyvid_processing::{OrchestratorConfig, QrComposer, UploadOrchestrator, VideoProbe};
use polyvid_storage::{
    ByteStream, MemoryStorage, ObjectMetadata, ProgressFn, Storage, StorageResult,
};
use polyvid_translate::Translator;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Storage wrapper that counts full-object downloads, so tests can prove
/// cache hits skip the object store.
pub struct CountingStorage {
    inner: MemoryStorage,
    downloads: AtomicUsize,
}

#[allow(dead_code)] // each test binary uses a different subset
impl CountingStorage {
    pub fn new() -> Self {
        Self {
            inner: MemoryStorage::new(),
            downloads: AtomicUsize::new(0),
        }
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }
}

#[async_trait]
impl Storage for CountingStorage {
    async fn put_file(
        &self,
        local_path: &Path,
        key: &str,
        content_type: &str,
        progress: Option<ProgressFn>,
    ) -> StorageResult<()> {
        self.inner.put_file(local_path, key, content_type, progress).await
    }

    async fn put_bytes(&self, key: &str, content_type: &str, data: Bytes) -> StorageResult<()> {
        self.inner.put_bytes(key, content_type, data).await
    }

    async fn download(&self, key: &str) -> StorageResult<Bytes> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.inner.download(key).await
    }

    async fn download_stream(&self, key: &str) -> StorageResult<ByteStream> {
        self.inner.download_stream(key).await
    }

    async fn get_range(&self, key: &str, start: u64, end: u64) -> StorageResult<ByteStream> {
        self.inner.get_range(key, start, end).await
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectMetadata> {
        self.inner.head(key).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}

// Some integration-test binaries only use a subset of the helpers.
#[allow(dead_code)]
pub struct TestApp {
    pub state: Arc<AppState>,
    pub storage: Arc<CountingStorage>,
    pub metastore: Arc<MemoryMetadataStore>,
}

/// Build an app state over in-memory backends with the given cache budget.
pub fn test_app(cache_budget_bytes: usize) -> TestApp {
    let config = Config {
        storage_backend: StorageBackend::Memory,
        cache_budget_bytes,
        ..Config::default()
    };

    let storage = Arc::new(CountingStorage::new());
    let metastore = Arc::new(MemoryMetadataStore::new());
    let translator = Arc::new(Translator::new(None, "http://localhost:0".to_string()));

    let orchestrator = Arc::new(UploadOrchestrator::new(
        storage.clone() as Arc<dyn Storage>,
        metastore.clone() as Arc<dyn MetadataStore>,
        translator.clone(),
        QrComposer::new(None),
        VideoProbe::new("/nonexistent/ffprobe".to_string()),
        OrchestratorConfig::from_config(&config),
    ));

    let proxy_cache = Arc::new(ProxyCache::new(
        config.cache_budget_bytes,
        config.cache_max_entries,
    ));
    let upload_status = Arc::new(UploadStatusMap::new(Duration::from_secs(
        config.upload_status_ttl_secs,
    )));

    let state = Arc::new(AppState {
        config,
        storage: storage.clone() as Arc<dyn Storage>,
        metastore: metastore.clone() as Arc<dyn MetadataStore>,
        translator,
        orchestrator,
        proxy_cache,
        upload_status,
    });

    TestApp {
        state,
        storage,
        metastore,
    }
}
