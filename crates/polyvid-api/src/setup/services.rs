//! Service construction and dependency injection.

use crate::cache::ProxyCache;
use crate::state::AppState;
use crate::upload_status::UploadStatusMap;
use anyhow::{Context, Result};
use polyvid_core::Config;
use polyvid_metastore::{MemoryMetadataStore, MetadataStore};
use polyvid_processing::{OrchestratorConfig, QrComposer, UploadOrchestrator, VideoProbe};
use polyvid_storage::create_storage;
use polyvid_translate::Translator;
use std::sync::Arc;
use std::time::Duration;

/// Build every service once and wire them into the shared state.
pub fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    let storage = create_storage(config).context("Failed to initialize storage backend")?;

    // The metadata store trait is the seam for document-database backends;
    // this process ships with the in-memory implementation.
    let metastore: Arc<dyn MetadataStore> = Arc::new(MemoryMetadataStore::new());

    let translator = Arc::new(Translator::from_config(config));
    let qr_composer = QrComposer::new(config.caption_font_path.as_deref());
    let probe = VideoProbe::new(config.ffprobe_path.clone());

    let orchestrator = Arc::new(UploadOrchestrator::new(
        storage.clone(),
        metastore.clone(),
        translator.clone(),
        qr_composer,
        probe,
        OrchestratorConfig::from_config(config),
    ));

    let proxy_cache = Arc::new(ProxyCache::new(
        config.cache_budget_bytes,
        config.cache_max_entries,
    ));
    let upload_status = Arc::new(UploadStatusMap::new(Duration::from_secs(
        config.upload_status_ttl_secs,
    )));

    Ok(Arc::new(AppState {
        config: config.clone(),
        storage,
        metastore,
        translator,
        orchestrator,
        proxy_cache,
        upload_status,
    }))
}
