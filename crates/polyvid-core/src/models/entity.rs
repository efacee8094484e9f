//! Upload-group entity and its per-language video variants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

use super::language::Language;

/// A stored object: its internal key plus the public proxy URL serving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StorageRef {
    pub key: String,
    pub url: String,
}

/// Technical metadata probed from a video file. Advisory only: extraction
/// failures produce zeroed values rather than failing the upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VideoTechMetadata {
    pub duration_seconds: u64,
    pub duration_string: String,
    pub width: u32,
    pub height: u32,
    pub fps: f32,
    pub file_size: i64,
}

impl VideoTechMetadata {
    /// `m:ss` rendering of a duration in seconds.
    pub fn format_duration(duration_seconds: u64) -> String {
        format!("{}:{:02}", duration_seconds / 60, duration_seconds % 60)
    }

    /// Zeroed metadata for when probing fails; file size is still known.
    pub fn zeroed(file_size: i64) -> Self {
        Self {
            duration_seconds: 0,
            duration_string: Self::format_duration(0),
            width: 0,
            height: 0,
            fps: 0.0,
            file_size,
        }
    }
}

/// One language-specific video file belonging to an entity.
///
/// At most one variant exists per language code; attaching again overwrites.
/// Exactly one variant per entity has `is_original = true`, set at creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LanguageVariant {
    pub language: Language,
    pub video: StorageRef,
    pub content_type: String,
    pub metadata: VideoTechMetadata,
    pub is_original: bool,
    pub uploaded_at: DateTime<Utc>,
}

/// One uploaded lecture: a group of language variants sharing a permanent
/// watch link, a storage folder fixed at creation, and QR/thumbnail assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Three-level taxonomy path, e.g. `장비/안전장비/헬멧`.
    pub category_path: String,
    /// Deterministic storage prefix; fixed at creation, all later language
    /// variants write under it.
    pub base_folder: String,
    /// `https://{domain}/watch/{id}` — constant for the entity's lifetime,
    /// the sole value embedded in the QR code.
    pub watch_link: String,
    pub qr: Option<StorageRef>,
    pub thumbnail: Option<StorageRef>,
    /// Variants keyed by language; starts with the original upload language
    /// and grows monotonically.
    pub variants: BTreeMap<Language, LanguageVariant>,
    pub tags: Vec<String>,
    pub total_file_size: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    /// The variant marked as the original upload, if present.
    pub fn original_variant(&self) -> Option<&LanguageVariant> {
        self.variants.values().find(|v| v.is_original)
    }

    /// Languages with an attached video, default language first.
    pub fn supported_languages(&self) -> Vec<Language> {
        Language::ALL
            .iter()
            .copied()
            .filter(|l| self.variants.contains_key(l))
            .collect()
    }
}
