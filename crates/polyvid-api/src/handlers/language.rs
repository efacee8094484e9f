//! Language-variant attach endpoint.

use crate::error::ErrorResponse;
use crate::error::HttpAppError;
use crate::handlers::upload::{read_text_field, spool_field_to_disk, status_progress};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use polyvid_core::models::Language;
use polyvid_core::AppError;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct AttachResponse {
    pub success: bool,
    pub language_code: Language,
    pub video_url: String,
    pub duration_seconds: u64,
    pub duration_string: String,
    pub file_size_bytes: i64,
}

#[utoipa::path(
    post,
    path = "/api/v0/entities/{id}/languages",
    tag = "entities",
    params(("id" = Uuid, Path, description = "Entity id")),
    responses(
        (status = 200, description = "Language variant attached", body = AttachResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 404, description = "Unknown entity", body = ErrorResponse),
        (status = 500, description = "Upload failed", body = ErrorResponse)
    )
)]
pub async fn attach_language(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<AttachResponse>, HttpAppError> {
    let temp_dir = tempfile::tempdir()
        .map_err(|e| HttpAppError(AppError::Internal(format!("Temp dir error: {}", e))))?;

    let mut language: Option<Language> = None;
    let mut upload_id = None;
    let mut video: Option<(PathBuf, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpAppError(AppError::BadRequest(format!("Malformed multipart: {}", e))))?
    {
        match field.name() {
            Some("language_code") => {
                let raw = read_text_field(field).await?;
                language = Some(raw.trim().parse::<Language>().map_err(|e| {
                    HttpAppError(AppError::InvalidInput(e))
                })?);
            }
            Some("upload_id") => {
                upload_id = Uuid::parse_str(read_text_field(field).await?.trim()).ok();
            }
            Some("video") => {
                video = Some(spool_field_to_disk(temp_dir.path(), field, "video.mp4").await?);
            }
            _ => {}
        }
    }

    let language = language.ok_or_else(|| {
        HttpAppError(AppError::BadRequest("language_code is required".to_string()))
    })?;
    let (video_path, video_filename) = video
        .ok_or_else(|| HttpAppError(AppError::BadRequest("Video file is required".to_string())))?;

    let progress = status_progress(&state, upload_id);
    let outcome = state
        .orchestrator
        .attach_language(id, language, &video_path, &video_filename, progress)
        .await
        .map_err(HttpAppError::from)?;

    Ok(Json(AttachResponse {
        success: true,
        language_code: outcome.language,
        video_url: outcome.video_url,
        duration_seconds: outcome.metadata.duration_seconds,
        duration_string: outcome.metadata.duration_string,
        file_size_bytes: outcome.metadata.file_size,
    }))
}
