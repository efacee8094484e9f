//! Application setup and initialization
//!
//! All initialization logic lives here rather than in main.rs: telemetry,
//! service construction, route assembly, and the background sweep tasks.

pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use polyvid_core::Config;
use std::sync::Arc;
use std::time::Duration;

/// Status-map cleanup cadence; entries expire after the configured TTL.
const STATUS_CLEANUP_INTERVAL_SECS: u64 = 300;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry();

    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;
    tracing::info!(
        backend = %config.storage_backend,
        public_base_url = %config.public_base_url,
        "Configuration loaded and validated"
    );

    let state = services::initialize_services(&config)?;
    let router = routes::build_router(state.clone());

    Ok((state, router))
}

/// Spawn the periodic cache sweep and upload-status cleanup tasks.
///
/// Separate from `initialize_app` so tests can build a router without
/// long-lived background tasks.
pub fn spawn_background_tasks(state: &Arc<AppState>) {
    let cache = state.proxy_cache.clone();
    let sweep_interval = Duration::from_secs(state.config.cache_sweep_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            cache.sweep();
        }
    });

    let status = state.upload_status.clone();
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(STATUS_CLEANUP_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            status.cleanup();
        }
    });
}
