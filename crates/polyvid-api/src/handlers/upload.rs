//! Entity creation endpoint and upload-progress polling.
//!
//! The multipart boundary is where raw request streams stop: fields are
//! spooled to a temp directory and the orchestrator only ever sees local
//! paths.

use crate::error::ErrorResponse;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    Json,
};
use polyvid_core::AppError;
use polyvid_processing::{NewEntityRequest, ProgressFn};
use serde::Serialize;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub entity_id: Uuid,
    pub watch_link: String,
    pub video_url: String,
    pub qr_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: u64,
    pub duration_string: String,
    pub width: u32,
    pub height: u32,
    pub fps: f32,
    pub file_size_bytes: i64,
}

/// Spool one multipart file field to disk in bounded chunks.
pub(crate) async fn spool_field_to_disk(
    dir: &FsPath,
    mut field: Field<'_>,
    default_name: &str,
) -> Result<(PathBuf, String), HttpAppError> {
    let filename = field
        .file_name()
        .filter(|name| !name.is_empty())
        .unwrap_or(default_name)
        .to_string();
    // Only the extension matters for the stored key; strip any client path
    let safe_name = FsPath::new(&filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(default_name)
        .to_string();

    let path = dir.join(&safe_name);
    let mut file = tokio::fs::File::create(&path)
        .await
        .map_err(|e| HttpAppError(AppError::Internal(format!("Temp file error: {}", e))))?;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| HttpAppError(AppError::BadRequest(format!("Upload stream error: {}", e))))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| HttpAppError(AppError::Internal(format!("Temp file error: {}", e))))?;
    }
    file.flush()
        .await
        .map_err(|e| HttpAppError(AppError::Internal(format!("Temp file error: {}", e))))?;

    Ok((path, safe_name))
}

pub(crate) async fn read_text_field(field: Field<'_>) -> Result<String, HttpAppError> {
    field
        .text()
        .await
        .map_err(|e| HttpAppError(AppError::BadRequest(format!("Invalid form field: {}", e))))
}

/// Progress callback that records into the status map under `upload_id`.
pub(crate) fn status_progress(state: &Arc<AppState>, upload_id: Option<Uuid>) -> Option<ProgressFn> {
    upload_id.map(|id| {
        let status_map = state.upload_status.clone();
        Arc::new(move |percent: u8, message: &str| {
            status_map.set(id, percent, message);
        }) as ProgressFn
    })
}

#[utoipa::path(
    post,
    path = "/api/v0/entities",
    tag = "entities",
    responses(
        (status = 200, description = "Entity created", body = UploadResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Upload failed", body = ErrorResponse)
    )
)]
pub async fn create_entity(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let temp_dir = tempfile::tempdir()
        .map_err(|e| HttpAppError(AppError::Internal(format!("Temp dir error: {}", e))))?;

    let mut title = None;
    let mut category_path = None;
    let mut description = None;
    let mut upload_id = None;
    let mut video: Option<(PathBuf, String)> = None;
    let mut thumbnail: Option<(PathBuf, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpAppError(AppError::BadRequest(format!("Malformed multipart: {}", e))))?
    {
        match field.name() {
            Some("title") => title = Some(read_text_field(field).await?),
            Some("category_path") => category_path = Some(read_text_field(field).await?),
            Some("description") => description = Some(read_text_field(field).await?),
            Some("upload_id") => {
                upload_id = Uuid::parse_str(read_text_field(field).await?.trim()).ok();
            }
            Some("video") => {
                video = Some(spool_field_to_disk(temp_dir.path(), field, "video.mp4").await?);
            }
            Some("thumbnail") => {
                let spooled = spool_field_to_disk(temp_dir.path(), field, "thumbnail.jpg").await?;
                // An empty optional file input arrives as a zero-byte part
                let size = tokio::fs::metadata(&spooled.0).await.map(|m| m.len()).unwrap_or(0);
                if size > 0 {
                    thumbnail = Some(spooled);
                }
            }
            _ => {}
        }
    }

    let title = title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| HttpAppError(AppError::BadRequest("Title is required".to_string())))?;
    let category_path = category_path.unwrap_or_default();
    let description = description
        .filter(|d| d.trim().chars().count() >= 10)
        .ok_or_else(|| {
            HttpAppError(AppError::BadRequest(
                "Description of at least 10 characters is required".to_string(),
            ))
        })?;
    let (video_path, video_filename) = video
        .ok_or_else(|| HttpAppError(AppError::BadRequest("Video file is required".to_string())))?;

    let (thumbnail_path, thumbnail_filename) = match thumbnail {
        Some((path, name)) => (Some(path), Some(name)),
        None => (None, None),
    };

    let request = NewEntityRequest {
        video_path,
        video_filename,
        thumbnail_path,
        thumbnail_filename,
        title,
        category_path,
        description,
    };

    let progress = status_progress(&state, upload_id);
    let outcome = state
        .orchestrator
        .create_entity(request, progress)
        .await
        .map_err(HttpAppError::from)?;

    Ok(Json(UploadResponse {
        success: true,
        entity_id: outcome.entity_id,
        watch_link: outcome.watch_link,
        video_url: outcome.video_url,
        qr_url: outcome.qr_url,
        thumbnail_url: outcome.thumbnail_url,
        duration_seconds: outcome.metadata.duration_seconds,
        duration_string: outcome.metadata.duration_string,
        width: outcome.metadata.width,
        height: outcome.metadata.height,
        fps: outcome.metadata.fps,
        file_size_bytes: outcome.metadata.file_size,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v0/uploads/{id}/status",
    tag = "entities",
    params(("id" = Uuid, Path, description = "Client-chosen upload id")),
    responses(
        (status = 200, description = "Current progress", body = crate::upload_status::UploadStatus),
        (status = 404, description = "Unknown or expired upload id", body = ErrorResponse)
    )
)]
pub async fn upload_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<crate::upload_status::UploadStatus>, HttpAppError> {
    state
        .upload_status
        .get(id)
        .map(Json)
        .ok_or_else(|| HttpAppError(AppError::NotFound(format!("No upload status for {}", id))))
}
