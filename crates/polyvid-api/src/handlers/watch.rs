//! Watch-link resolution: the permanent URL embedded in every QR code.

use crate::error::ErrorResponse;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use polyvid_core::models::{Entity, Language, WatchResolution};
use polyvid_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct WatchQuery {
    /// Requested playback language; unsupported codes fall back to the
    /// original upload language.
    pub lang: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WatchResponse {
    pub entity_id: Uuid,
    pub title: String,
    #[serde(flatten)]
    pub resolution: WatchResolution,
    pub available_languages: Vec<Language>,
}

fn parse_entity_id(raw: &str) -> Result<Uuid, HttpAppError> {
    // A malformed id is indistinguishable from an unknown one to callers
    Uuid::parse_str(raw)
        .map_err(|_| HttpAppError(AppError::NotFound(format!("Entity not found: {}", raw))))
}

async fn load_entity(state: &Arc<AppState>, raw_id: &str) -> Result<Entity, HttpAppError> {
    let entity_id = parse_entity_id(raw_id)?;
    state
        .metastore
        .get_entity(entity_id)
        .await
        .map_err(HttpAppError::from)?
        .ok_or_else(|| HttpAppError(AppError::NotFound(format!("Entity not found: {}", entity_id))))
}

#[utoipa::path(
    get,
    path = "/api/v0/watch/{id}",
    tag = "watch",
    params(("id" = String, Path, description = "Entity id"), WatchQuery),
    responses(
        (status = 200, description = "Resolved variant", body = WatchResponse),
        (status = 404, description = "Unknown entity", body = ErrorResponse)
    )
)]
pub async fn resolve_watch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<WatchQuery>,
) -> Result<Json<WatchResponse>, HttpAppError> {
    let entity = load_entity(&state, &id).await?;

    // Unsupported codes collapse to the default (original) language
    let requested = query
        .lang
        .as_deref()
        .and_then(|code| code.parse::<Language>().ok());
    let resolution = entity.resolve_watch(requested).ok_or_else(|| {
        HttpAppError(AppError::NotFound(format!(
            "No playable video for entity {}",
            entity.id
        )))
    })?;

    Ok(Json(WatchResponse {
        entity_id: entity.id,
        title: entity.title.clone(),
        resolution,
        available_languages: entity.supported_languages(),
    }))
}

/// Minimal watch page behind the QR link. The full player UI lives
/// elsewhere; this page must always render something, so any failure
/// degrades to a plain-text body instead of an error page.
pub async fn watch_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<WatchQuery>,
) -> Response {
    let entity = match load_entity(&state, &id).await {
        Ok(entity) => entity,
        Err(_) => {
            return (StatusCode::NOT_FOUND, "Video not found").into_response();
        }
    };

    let requested = query
        .lang
        .as_deref()
        .and_then(|code| code.parse::<Language>().ok());
    match entity.resolve_watch(requested) {
        Some(resolution) => Html(render_watch_page(&entity, &resolution)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            format!("No playable video for {}", entity.title),
        )
            .into_response(),
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn render_watch_page(entity: &Entity, resolution: &WatchResolution) -> String {
    let title = escape_html(&entity.title);
    let notice = if resolution.has_requested_language {
        String::new()
    } else {
        format!(
            "<p class=\"notice\">Not yet available in your language; playing {}.</p>",
            resolution.actual_language.native_name()
        )
    };
    let languages = entity
        .supported_languages()
        .iter()
        .map(|l| {
            format!(
                "<a href=\"?lang={}\">{}</a>",
                l.code(),
                l.native_name()
            )
        })
        .collect::<Vec<_>>()
        .join(" | ");

    format!(
        "<!DOCTYPE html>\n<html lang=\"{lang}\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n\
         <style>body{{font-family:sans-serif;max-width:800px;margin:0 auto;padding:16px}}\
         video{{width:100%}}.notice{{color:#a60}}</style>\n</head>\n<body>\n\
         <h1>{title}</h1>\n{notice}\n\
         <video controls preload=\"metadata\" src=\"{src}\"></video>\n\
         <p>{languages}</p>\n</body>\n</html>\n",
        lang = resolution.actual_language.code(),
        title = title,
        notice = notice,
        src = resolution.video_url,
        languages = languages,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&c"), "a&lt;b&gt;&amp;c");
    }
}
