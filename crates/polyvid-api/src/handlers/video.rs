//! Range-aware video streaming route.
//!
//! Videos are never buffered into the proxy cache. Every request starts with
//! a HEAD-style metadata fetch; conditional requests short-circuit to 304,
//! validated byte ranges stream as 206, invalid ranges are 416, and
//! everything else streams the full object with `Accept-Ranges: bytes` so
//! players can start scrubbing on the next request. Bodies are chunked
//! streams end to end; a failed ranged fetch degrades to a full stream.

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
use polyvid_storage::ObjectMetadata;
use std::sync::Arc;

/// Parsed `Range` header outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeRequest {
    /// No usable range; serve the whole object.
    Full,
    /// Syntactically a byte range, but unsatisfiable for this length.
    Invalid,
    /// Inclusive byte span within the object.
    Span(u64, u64),
}

/// Parse a `bytes=start-end` range (end optional) against an object length.
///
/// Non-`bytes` units and absent headers serve the full object; a parsed
/// range must satisfy `0 <= start <= end < length` or it is rejected.
fn parse_range(header_value: Option<&str>, length: u64) -> RangeRequest {
    let Some(raw) = header_value else {
        return RangeRequest::Full;
    };
    let Some(range_value) = raw.trim().strip_prefix("bytes=") else {
        return RangeRequest::Full;
    };

    let Some((start_raw, end_raw)) = range_value.trim().split_once('-') else {
        return RangeRequest::Invalid;
    };

    let Ok(start) = start_raw.trim().parse::<u64>() else {
        return RangeRequest::Invalid;
    };
    let end = if end_raw.trim().is_empty() {
        length.saturating_sub(1)
    } else {
        match end_raw.trim().parse::<u64>() {
            Ok(end) => end,
            Err(_) => return RangeRequest::Invalid,
        }
    };

    // 0 <= start <= end < length, or the range is unsatisfiable
    if length == 0 || start > end || end >= length {
        return RangeRequest::Invalid;
    }
    RangeRequest::Span(start, end)
}

#[utoipa::path(
    get,
    path = "/video/{key}",
    tag = "proxy",
    params(("key" = String, Path, description = "Storage key of the video")),
    responses(
        (status = 200, description = "Full video stream"),
        (status = 206, description = "Partial content for a byte range"),
        (status = 304, description = "Not modified"),
        (status = 404, description = "Unknown storage key", body = ErrorResponse),
        (status = 416, description = "Range not satisfiable", body = ErrorResponse)
    )
)]
pub async fn serve_video(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let meta = state.storage.head(&key).await.map_err(HttpAppError::from)?;

    if conditional::if_none_match(&headers, &meta.etag) {
        return conditional::not_modified(&meta.etag);
    }

    let range_header = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok());

    match parse_range(range_header, meta.length) {
        RangeRequest::Invalid => Err(HttpAppError(AppError::RangeNotSatisfiable(format!(
            "{} for object of {} bytes",
            range_header.unwrap_or(""),
            meta.length
        )))),
        RangeRequest::Span(start, end) => {
            match state.storage.get_range(&key, start, end).await {
                Ok(stream) => partial_response(&meta, start, end, stream),
                Err(e) => {
                    tracing::warn!(
                        key = %key,
                        start,
                        end,
                        error = %e,
                        "Ranged fetch failed, streaming full object"
                    );
                    full_response(&state, &key, &meta).await
                }
            }
        }
        RangeRequest::Full => full_response(&state, &key, &meta).await,
    }
}

async fn full_response(
    state: &Arc<AppState>,
    key: &str,
    meta: &ObjectMetadata,
) -> Result<Response, HttpAppError> {
    let stream = state
        .storage
        .download_stream(key)
        .await
        .map_err(HttpAppError::from)?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &meta.content_type)
        .header(header::CONTENT_LENGTH, meta.length)
        .header(header::ACCEPT_RANGES, "bytes");
    if !meta.etag.is_empty() {
        builder = builder.header(header::ETAG, &meta.etag);
    }
    builder
        .body(Body::from_stream(stream))
        .map_err(|e| HttpAppError(AppError::Internal(format!("Failed to build response: {}", e))))
}

fn partial_response(
    meta: &ObjectMetadata,
    start: u64,
    end: u64,
    stream: polyvid_storage::ByteStream,
) -> Result<Response, HttpAppError> {
    let mut builder = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_TYPE, &meta.content_type)
        .header(header::CONTENT_LENGTH, end - start + 1)
        .header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", start, end, meta.length),
        )
        .header(header::ACCEPT_RANGES, "bytes");
    if !meta.etag.is_empty() {
        builder = builder.header(header::ETAG, &meta.etag);
    }
    builder
        .body(Body::from_stream(stream))
        .map_err(|e| HttpAppError(AppError::Internal(format!("Failed to build response: {}", e))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_header_serves_full() {
        assert_eq!(parse_range(None, 1000), RangeRequest::Full);
    }

    #[test]
    fn test_non_bytes_unit_serves_full() {
        assert_eq!(parse_range(Some("items=0-5"), 1000), RangeRequest::Full);
    }

    #[test]
    fn test_bounded_range() {
        assert_eq!(parse_range(Some("bytes=0-99"), 1000), RangeRequest::Span(0, 99));
        assert_eq!(
            parse_range(Some("bytes=500-999"), 1000),
            RangeRequest::Span(500, 999)
        );
    }

    #[test]
    fn test_open_ended_range_defaults_to_last_byte() {
        assert_eq!(
            parse_range(Some("bytes=100-"), 1000),
            RangeRequest::Span(100, 999)
        );
    }

    #[test]
    fn test_end_beyond_length_is_invalid() {
        assert_eq!(parse_range(Some("bytes=0-5000"), 1000), RangeRequest::Invalid);
    }

    #[test]
    fn test_start_beyond_length_is_invalid() {
        assert_eq!(parse_range(Some("bytes=1000-1000"), 1000), RangeRequest::Invalid);
        assert_eq!(parse_range(Some("bytes=1500-"), 1000), RangeRequest::Invalid);
    }

    #[test]
    fn test_inverted_range_is_invalid() {
        assert_eq!(parse_range(Some("bytes=50-20"), 1000), RangeRequest::Invalid);
    }

    #[test]
    fn test_suffix_and_garbage_forms_are_invalid() {
        assert_eq!(parse_range(Some("bytes=-500"), 1000), RangeRequest::Invalid);
        assert_eq!(parse_range(Some("bytes=abc-def"), 1000), RangeRequest::Invalid);
        assert_eq!(parse_range(Some("bytes=12"), 1000), RangeRequest::Invalid);
    }

    #[test]
    fn test_zero_length_object_has_no_satisfiable_range() {
        assert_eq!(parse_range(Some("bytes=0-0"), 0), RangeRequest::Invalid);
    }
}
