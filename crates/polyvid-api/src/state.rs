//! Application state.
//!
//! All services are explicitly constructed at startup and injected into
//! handlers through `Arc<AppState>`; there are no lazily-initialized
//! module-level globals.

use crate::cache::ProxyCache;
use crate::upload_status::UploadStatusMap;
use polyvid_core::Config;
use polyvid_metastore::MetadataStore;
use polyvid_processing::UploadOrchestrator;
use polyvid_storage::Storage;
use polyvid_translate::Translator;
use std::sync::Arc;

/// Main application state: aggregates services for dependency injection.
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub metastore: Arc<dyn MetadataStore>,
    pub translator: Arc<Translator>,
    pub orchestrator: Arc<UploadOrchestrator>,
    pub proxy_cache: Arc<ProxyCache>,
    pub upload_status: Arc<UploadStatusMap>,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
