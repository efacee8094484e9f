//! Route assembly and middleware layers.

use crate::handlers::{
    entities, health, language, proxy, translate, upload, video, watch,
};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use polyvid_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Slack on top of the configured video cap for multipart framing and
/// the accompanying form fields.
const BODY_LIMIT_SLACK_BYTES: usize = 64 * 1024 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state
        .config
        .max_video_size_bytes
        .saturating_add(BODY_LIMIT_SLACK_BYTES);
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health::health))
        // Public watch surface (embedded in QR codes)
        .route("/watch/{id}", get(watch::watch_page))
        // Storage proxy
        .route("/qr/{*key}", get(proxy::serve_qr))
        .route("/thumbnail/{*key}", get(proxy::serve_thumbnail))
        .route("/file/{*key}", get(proxy::serve_file))
        .route("/video/{*key}", get(video::serve_video))
        // JSON API
        .route("/api/v0/watch/{id}", get(watch::resolve_watch))
        .route(
            "/api/v0/entities",
            get(entities::list_entities).post(upload::create_entity),
        )
        .route(
            "/api/v0/entities/{id}",
            get(entities::get_entity).delete(entities::delete_entity),
        )
        .route(
            "/api/v0/entities/{id}/languages",
            post(language::attach_language),
        )
        .route("/api/v0/uploads/{id}/status", get(upload::upload_status))
        .route("/api/v0/translate", post(translate::translate))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
