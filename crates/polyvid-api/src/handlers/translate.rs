//! Translation preview endpoint for the upload form.

use crate::error::ErrorResponse;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use polyvid_core::models::Language;
use polyvid_core::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct TranslateRequest {
    pub text: String,
    /// Subset of target languages to return; defaults to all five.
    pub target_languages: Option<Vec<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TranslateResponse {
    pub translations: BTreeMap<Language, String>,
}

#[utoipa::path(
    post,
    path = "/api/v0/translate",
    tag = "translate",
    request_body = TranslateRequest,
    responses(
        (status = 200, description = "Filename-safe translations", body = TranslateResponse),
        (status = 400, description = "Missing text", body = ErrorResponse)
    )
)]
pub async fn translate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, HttpAppError> {
    if request.text.trim().is_empty() {
        return Err(HttpAppError(AppError::BadRequest(
            "Text to translate is required".to_string(),
        )));
    }

    let requested: Vec<Language> = match &request.target_languages {
        Some(codes) => codes
            .iter()
            .filter_map(|code| code.parse::<Language>().ok())
            .collect(),
        None => Language::TARGETS.to_vec(),
    };

    let mut translations = state.translator.translate_title(&request.text).await;
    translations.retain(|language, _| *language == Language::Ko || requested.contains(language));

    Ok(Json(TranslateResponse { translations }))
}
