//! Cache-fronted proxy routes for small immutable assets.
//!
//! `/qr`, `/thumbnail`, and `/file` serve whole objects. A miss fetches the
//! full object from storage and caches it unless it exceeds its category's
//! item ceiling; oversize objects are still served, just never cached. The
//! `/video` route never goes through this path.

use crate::cache::{CacheCategory, CachedObject};
use crate::error::ErrorResponse;
use crate::error::HttpAppError;
use crate::handlers::conditional;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use polyvid_core::AppError;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/qr/{key}",
    tag = "proxy",
    params(("key" = String, Path, description = "Storage key of the QR image")),
    responses(
        (status = 200, description = "QR image bytes"),
        (status = 304, description = "Not modified"),
        (status = 404, description = "Unknown storage key", body = ErrorResponse)
    )
)]
pub async fn serve_qr(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    serve_cached(state, CacheCategory::Qr, key, headers).await
}

#[utoipa::path(
    get,
    path = "/thumbnail/{key}",
    tag = "proxy",
    params(("key" = String, Path, description = "Storage key of the thumbnail")),
    responses(
        (status = 200, description = "Thumbnail bytes"),
        (status = 304, description = "Not modified"),
        (status = 404, description = "Unknown storage key", body = ErrorResponse)
    )
)]
pub async fn serve_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    serve_cached(state, CacheCategory::Thumbnail, key, headers).await
}

#[utoipa::path(
    get,
    path = "/file/{key}",
    tag = "proxy",
    params(("key" = String, Path, description = "Storage key")),
    responses(
        (status = 200, description = "File bytes"),
        (status = 304, description = "Not modified"),
        (status = 404, description = "Unknown storage key", body = ErrorResponse)
    )
)]
pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    serve_cached(state, CacheCategory::File, key, headers).await
}

async fn serve_cached(
    state: Arc<AppState>,
    category: CacheCategory,
    key: String,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    if let Some(hit) = state.proxy_cache.get(category, &key) {
        tracing::debug!(category = category.as_str(), key = %key, "Proxy cache hit");
        return asset_response(hit, &headers);
    }

    let meta = state.storage.head(&key).await.map_err(HttpAppError::from)?;
    let bytes = state
        .storage
        .download(&key)
        .await
        .map_err(HttpAppError::from)?;

    let object = CachedObject {
        bytes,
        content_type: meta.content_type,
        etag: meta.etag,
    };
    state
        .proxy_cache
        .insert_if_cacheable(category, &key, object.clone());

    asset_response(object, &headers)
}

fn asset_response(object: CachedObject, headers: &HeaderMap) -> Result<Response, HttpAppError> {
    if conditional::if_none_match(headers, &object.etag) {
        return conditional::not_modified(&object.etag);
    }

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &object.content_type)
        .header(header::CONTENT_LENGTH, object.bytes.len())
        .header(
            header::CACHE_CONTROL,
            "public, max-age=31536000, immutable",
        );
    if !object.etag.is_empty() {
        builder = builder.header(header::ETAG, &object.etag);
    }
    builder
        .body(Body::from(object.bytes))
        .map_err(|e| HttpAppError(AppError::Internal(format!("Failed to build response: {}", e))))
}
