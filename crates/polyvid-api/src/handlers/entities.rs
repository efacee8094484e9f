//! Entity listing, status, and deletion.

use crate::error::ErrorResponse;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use polyvid_core::models::{Entity, Language};
use polyvid_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Listing cap; keeps responses bounded regardless of corpus size.
const MAX_LIST_LIMIT: usize = 50;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EntitySummary {
    pub id: Uuid,
    pub title: String,
    pub category_path: String,
    pub watch_link: String,
    pub languages: Vec<Language>,
    pub language_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EntityListResponse {
    pub entities: Vec<EntitySummary>,
    pub total: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VariantDetail {
    pub language: Language,
    pub language_name: String,
    pub video_url: String,
    pub content_type: String,
    pub file_size: i64,
    pub duration_string: String,
    pub resolution: String,
    pub fps: f32,
    pub is_original: bool,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EntityDetail {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category_path: String,
    pub watch_link: String,
    pub qr_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub tags: Vec<String>,
    pub total_file_size: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub variants: Vec<VariantDetail>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub deleted_files: Vec<String>,
}

fn summarize(entity: &Entity) -> EntitySummary {
    EntitySummary {
        id: entity.id,
        title: entity.title.clone(),
        category_path: entity.category_path.clone(),
        watch_link: entity.watch_link.clone(),
        languages: entity.supported_languages(),
        language_count: entity.variants.len(),
        created_at: entity.created_at,
    }
}

fn detail(entity: &Entity) -> EntityDetail {
    EntityDetail {
        id: entity.id,
        title: entity.title.clone(),
        description: entity.description.clone(),
        category_path: entity.category_path.clone(),
        watch_link: entity.watch_link.clone(),
        qr_url: entity.qr.as_ref().map(|r| r.url.clone()),
        thumbnail_url: entity.thumbnail.as_ref().map(|r| r.url.clone()),
        tags: entity.tags.clone(),
        total_file_size: entity.total_file_size,
        created_at: entity.created_at,
        updated_at: entity.updated_at,
        variants: entity
            .variants
            .values()
            .map(|v| VariantDetail {
                language: v.language,
                language_name: v.language.native_name().to_string(),
                video_url: v.video.url.clone(),
                content_type: v.content_type.clone(),
                file_size: v.metadata.file_size,
                duration_string: v.metadata.duration_string.clone(),
                resolution: format!("{}x{}", v.metadata.width, v.metadata.height),
                fps: v.metadata.fps,
                is_original: v.is_original,
                uploaded_at: v.uploaded_at,
            })
            .collect(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v0/entities",
    tag = "entities",
    params(ListQuery),
    responses((status = 200, description = "Recent entities", body = EntityListResponse))
)]
pub async fn list_entities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<EntityListResponse>, HttpAppError> {
    let limit = query.limit.unwrap_or(MAX_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let entities = state
        .metastore
        .list_entities(limit)
        .await
        .map_err(HttpAppError::from)?;

    Ok(Json(EntityListResponse {
        total: entities.len(),
        entities: entities.iter().map(summarize).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v0/entities/{id}",
    tag = "entities",
    params(("id" = Uuid, Path, description = "Entity id")),
    responses(
        (status = 200, description = "Entity detail", body = EntityDetail),
        (status = 404, description = "Unknown entity", body = ErrorResponse)
    )
)]
pub async fn get_entity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<EntityDetail>, HttpAppError> {
    let entity = state
        .metastore
        .get_entity(id)
        .await
        .map_err(HttpAppError::from)?
        .ok_or_else(|| HttpAppError(AppError::NotFound(format!("Entity not found: {}", id))))?;

    Ok(Json(detail(&entity)))
}

#[utoipa::path(
    delete,
    path = "/api/v0/entities/{id}",
    tag = "entities",
    params(("id" = Uuid, Path, description = "Entity id")),
    responses(
        (status = 200, description = "Entity deleted", body = DeleteResponse),
        (status = 404, description = "Unknown entity", body = ErrorResponse)
    )
)]
pub async fn delete_entity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, HttpAppError> {
    let entity = state
        .metastore
        .delete_entity(id)
        .await
        .map_err(HttpAppError::from)?
        .ok_or_else(|| HttpAppError(AppError::NotFound(format!("Entity not found: {}", id))))?;

    // Storage cleanup is best-effort; metadata is already gone and orphaned
    // objects are cheaper than dangling records
    let mut keys: Vec<String> = entity
        .variants
        .values()
        .map(|v| v.video.key.clone())
        .collect();
    if let Some(qr) = &entity.qr {
        keys.push(qr.key.clone());
    }
    if let Some(thumbnail) = &entity.thumbnail {
        keys.push(thumbnail.key.clone());
    }

    let mut deleted_files = Vec::new();
    for key in keys {
        match state.storage.delete(&key).await {
            Ok(()) => deleted_files.push(key),
            Err(e) => {
                tracing::warn!(entity_id = %id, key = %key, error = %e, "Failed to delete storage object");
            }
        }
    }

    tracing::info!(entity_id = %id, deleted = deleted_files.len(), "Entity deleted");
    Ok(Json(DeleteResponse { deleted_files }))
}
