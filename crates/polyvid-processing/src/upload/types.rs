//! Request and tagged-outcome types for the upload flows.

use polyvid_core::models::{Language, VideoTechMetadata};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Progress callback: `(percent 0-100, human-readable stage)`. Optional for
/// every flow; its absence changes nothing.
pub type ProgressFn = Arc<dyn Fn(u8, &str) + Send + Sync>;

/// Inputs for creating a new entity. The form layer has already saved the
/// uploaded files to local disk; the core never sees raw request streams.
#[derive(Debug, Clone)]
pub struct NewEntityRequest {
    pub video_path: PathBuf,
    /// Original upload filename, used for extension/content-type checks.
    pub video_filename: String,
    pub thumbnail_path: Option<PathBuf>,
    pub thumbnail_filename: Option<String>,
    pub title: String,
    pub category_path: String,
    pub description: String,
}

/// Successful entity creation. Degradable assets (thumbnail, QR) are
/// `None` when their step failed; the upload itself still succeeded.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub entity_id: Uuid,
    pub watch_link: String,
    pub video_url: String,
    pub qr_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub metadata: VideoTechMetadata,
}

/// Successful language attach.
#[derive(Debug, Clone)]
pub struct AttachOutcome {
    pub language: Language,
    pub video_url: String,
    pub metadata: VideoTechMetadata,
}
