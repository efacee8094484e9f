//! Proxy behavior tests: byte ranges, conditional fetches, cache ceilings.

mod helpers;

use axum::http::{header, HeaderValue};
use axum_test::TestServer;
use bytes::Bytes;
use helpers::test_app;
use polyvid_api::setup::routes::build_router;
use polyvid_storage::Storage;

async fn seed(app: &helpers::TestApp, key: &str, content_type: &str, size: usize) {
    app.storage
        .inner()
        .put_bytes(key, content_type, Bytes::from(vec![7u8; size]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_video_range_returns_exact_span() {
    let app = test_app(64 * 1024);
    let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
    app.storage
        .inner()
        .put_bytes("videos/x/clip_video_ko.mp4", "video/mp4", Bytes::from(data.clone()))
        .await
        .unwrap();
    let server = TestServer::new(build_router(app.state.clone())).unwrap();

    let response = server
        .get("/video/videos/x/clip_video_ko.mp4")
        .add_header(header::RANGE, HeaderValue::from_static("bytes=0-99"))
        .await;

    assert_eq!(response.status_code(), 206);
    assert_eq!(response.as_bytes().len(), 100);
    assert_eq!(response.as_bytes().as_ref(), &data[0..100]);
    assert_eq!(
        response.header(header::CONTENT_RANGE).to_str().unwrap(),
        "bytes 0-99/1000"
    );
    assert_eq!(
        response.header(header::ACCEPT_RANGES).to_str().unwrap(),
        "bytes"
    );
}

#[tokio::test]
async fn test_video_range_beyond_length_is_416() {
    let app = test_app(64 * 1024);
    seed(&app, "videos/x/v.mp4", "video/mp4", 1000).await;
    let server = TestServer::new(build_router(app.state.clone())).unwrap();

    let response = server
        .get("/video/videos/x/v.mp4")
        .add_header(header::RANGE, HeaderValue::from_static("bytes=1000-1000"))
        .await;
    assert_eq!(response.status_code(), 416);

    let response = server
        .get("/video/videos/x/v.mp4")
        .add_header(header::RANGE, HeaderValue::from_static("bytes=50-20"))
        .await;
    assert_eq!(response.status_code(), 416);
}

#[tokio::test]
async fn test_video_without_range_streams_full_object() {
    let app = test_app(64 * 1024);
    seed(&app, "videos/x/v.mp4", "video/mp4", 1000).await;
    let server = TestServer::new(build_router(app.state.clone())).unwrap();

    let response = server.get("/video/videos/x/v.mp4").await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.as_bytes().len(), 1000);
    assert_eq!(
        response.header(header::ACCEPT_RANGES).to_str().unwrap(),
        "bytes"
    );
    assert_eq!(
        response.header(header::CONTENT_TYPE).to_str().unwrap(),
        "video/mp4"
    );
    // Videos never enter the proxy cache
    assert!(app.state.proxy_cache.is_empty());
}

#[tokio::test]
async fn test_video_conditional_fetch_returns_304() {
    let app = test_app(64 * 1024);
    seed(&app, "videos/x/v.mp4", "video/mp4", 1000).await;
    let server = TestServer::new(build_router(app.state.clone())).unwrap();

    let first = server.get("/video/videos/x/v.mp4").await;
    let etag = first.header(header::ETAG);

    let second = server
        .get("/video/videos/x/v.mp4")
        .add_header(header::IF_NONE_MATCH, etag.clone())
        .await;

    assert_eq!(second.status_code(), 304);
    assert!(second.as_bytes().is_empty());
    assert_eq!(second.header(header::ETAG), etag);
}

#[tokio::test]
async fn test_unknown_key_is_404() {
    let app = test_app(64 * 1024);
    let server = TestServer::new(build_router(app.state.clone())).unwrap();

    assert_eq!(server.get("/video/videos/missing.mp4").await.status_code(), 404);
    assert_eq!(server.get("/qr/videos/missing.png").await.status_code(), 404);
}

#[tokio::test]
async fn test_cached_asset_is_fetched_once() {
    // Budget 10_000: qr ceiling is 1_000 bytes
    let app = test_app(10_000);
    seed(&app, "videos/x/t_qr_combined.png", "image/png", 500).await;
    let server = TestServer::new(build_router(app.state.clone())).unwrap();

    let first = server.get("/qr/videos/x/t_qr_combined.png").await;
    assert_eq!(first.status_code(), 200);
    assert_eq!(first.as_bytes().len(), 500);
    assert_eq!(app.storage.download_count(), 1);

    let second = server.get("/qr/videos/x/t_qr_combined.png").await;
    assert_eq!(second.status_code(), 200);
    assert_eq!(second.as_bytes().len(), 500);
    // Served from cache: no second object-store fetch
    assert_eq!(app.storage.download_count(), 1);
    assert_eq!(app.state.proxy_cache.len(), 1);
}

#[tokio::test]
async fn test_oversize_asset_served_but_never_cached() {
    // Budget 10_000: qr ceiling 1_000, object is 2_000
    let app = test_app(10_000);
    seed(&app, "videos/x/big_qr_combined.png", "image/png", 2_000).await;
    let server = TestServer::new(build_router(app.state.clone())).unwrap();

    let first = server.get("/qr/videos/x/big_qr_combined.png").await;
    assert_eq!(first.status_code(), 200);
    assert_eq!(first.as_bytes().len(), 2_000);
    assert!(app.state.proxy_cache.is_empty());

    let second = server.get("/qr/videos/x/big_qr_combined.png").await;
    assert_eq!(second.status_code(), 200);
    // Every request goes back to the object store
    assert_eq!(app.storage.download_count(), 2);
}

#[tokio::test]
async fn test_thumbnail_ceiling_is_more_generous_than_qr() {
    // Budget 10_000: qr ceiling 1_000, thumbnail ceiling 2_000
    let app = test_app(10_000);
    seed(&app, "videos/x/a_qr_combined.png", "image/png", 1_500).await;
    seed(&app, "videos/x/a_thumbnail.jpg", "image/jpeg", 1_500).await;
    let server = TestServer::new(build_router(app.state.clone())).unwrap();

    server.get("/qr/videos/x/a_qr_combined.png").await;
    server.get("/thumbnail/videos/x/a_thumbnail.jpg").await;

    // Same size, different category: only the thumbnail fits its ceiling
    assert_eq!(app.state.proxy_cache.len(), 1);
}

#[tokio::test]
async fn test_cached_asset_supports_conditional_fetch() {
    let app = test_app(10_000);
    seed(&app, "videos/x/t_qr_combined.png", "image/png", 100).await;
    let server = TestServer::new(build_router(app.state.clone())).unwrap();

    let first = server.get("/qr/videos/x/t_qr_combined.png").await;
    let etag = first.header(header::ETAG);

    let second = server
        .get("/qr/videos/x/t_qr_combined.png")
        .add_header(header::IF_NONE_MATCH, etag)
        .await;
    assert_eq!(second.status_code(), 304);
    assert!(second.as_bytes().is_empty());
}

#[tokio::test]
async fn test_file_route_serves_generic_objects() {
    let app = test_app(64 * 1024);
    seed(&app, "videos/x/notes.bin", "application/octet-stream", 64).await;
    let server = TestServer::new(build_router(app.state.clone())).unwrap();

    let response = server.get("/file/videos/x/notes.bin").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.as_bytes().len(), 64);
}
