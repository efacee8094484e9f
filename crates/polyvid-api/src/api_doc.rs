//! OpenAPI document aggregate.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Polyvid API",
        description = "Multi-language training-video upload and delivery proxy"
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::proxy::serve_qr,
        crate::handlers::proxy::serve_thumbnail,
        crate::handlers::proxy::serve_file,
        crate::handlers::video::serve_video,
        crate::handlers::watch::resolve_watch,
        crate::handlers::entities::list_entities,
        crate::handlers::entities::get_entity,
        crate::handlers::entities::delete_entity,
        crate::handlers::upload::create_entity,
        crate::handlers::upload::upload_status,
        crate::handlers::language::attach_language,
        crate::handlers::translate::translate,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::handlers::entities::DeleteResponse,
        crate::handlers::entities::EntityDetail,
        crate::handlers::entities::EntityListResponse,
        crate::handlers::entities::EntitySummary,
        crate::handlers::entities::VariantDetail,
        crate::handlers::health::HealthResponse,
        crate::handlers::language::AttachResponse,
        crate::handlers::translate::TranslateRequest,
        crate::handlers::translate::TranslateResponse,
        crate::handlers::upload::UploadResponse,
        crate::handlers::watch::WatchResponse,
        crate::upload_status::UploadStatus,
        polyvid_core::models::Language,
        polyvid_core::models::WatchResolution,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "proxy", description = "Cache-fronted storage proxy and video streaming"),
        (name = "watch", description = "Watch-link resolution"),
        (name = "entities", description = "Upload and language management"),
        (name = "translate", description = "Title translation preview"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        assert!(!doc.paths.paths.is_empty());
    }
}
