//! Polyvid API
//!
//! HTTP surface of the system: upload and language-attach endpoints for the
//! form layer, the cache-fronted asset proxy, the range-aware video route,
//! and watch-link resolution.

pub mod api_doc;
pub mod cache;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod upload_status;

use anyhow::Result;
use polyvid_core::Config;

/// Load config, initialize services, and serve until shutdown.
pub async fn run() -> Result<()> {
    let config = Config::from_env()?;

    let (state, router) = setup::initialize_app(config.clone()).await?;
    setup::spawn_background_tasks(&state);

    setup::server::start_server(&config, router).await?;

    Ok(())
}
