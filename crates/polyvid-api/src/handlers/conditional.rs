//! Conditional-request helpers shared by the proxy routes.

use crate::error::HttpAppError;
use axum::{
    body::Body,
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use polyvid_core::AppError;

/// Whether the request's `If-None-Match` matches the current ETag.
pub fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
    if etag.is_empty() {
        return false;
    }
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|raw| raw.split(',').any(|t| t.trim() == etag || t.trim() == "*"))
        .unwrap_or(false)
}

/// Empty 304 carrying the ETag so clients can keep validating.
pub fn not_modified(etag: &str) -> Result<Response, HttpAppError> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(header::ETAG, etag)
        .body(Body::empty())
        .map_err(|e| HttpAppError(AppError::Internal(format!("Failed to build response: {}", e))))
}
