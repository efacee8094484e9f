//! Upload orchestrator: the only writer of entities and language variants.
//!
//! Both flows are strictly sequential within one call; later steps depend on
//! keys produced by earlier ones. The mandatory video upload and the final
//! metadata batch are fatal on failure; thumbnail, QR, and metadata probing
//! degrade (missing field / zeroed values) without failing the operation.
//! Storage objects written before a fatal metadata failure are left in place
//! as orphans for out-of-band cleanup; a dangling metadata record is never
//! produced because metadata is written last.

use bytes::Bytes;
use chrono::Utc;
use polyvid_core::media_types;
use polyvid_core::models::{Entity, Language, LanguageVariant, StorageRef, TranslationRecord};
use polyvid_core::urls::proxy_url;
use polyvid_core::{AppError, Config};
use polyvid_metastore::MetadataStore;
use polyvid_storage::{derive_base_folder, derive_object_key, AssetRole, Storage};
use polyvid_translate::{make_filename_safe, Translator};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::qr::QrComposer;
use crate::upload::tags::extract_tags;
use crate::upload::types::{AttachOutcome, NewEntityRequest, ProgressFn, UploadOutcome};
use crate::validator::MediaValidator;
use crate::video::VideoProbe;

/// Limits and URL settings the orchestrator needs from the app config.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub public_base_url: String,
    pub max_video_size_bytes: usize,
    pub video_allowed_extensions: Vec<String>,
    pub video_allowed_content_types: Vec<String>,
    pub max_image_size_bytes: usize,
    pub image_allowed_extensions: Vec<String>,
    pub image_allowed_content_types: Vec<String>,
}

impl OrchestratorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            public_base_url: config.public_base_url.clone(),
            max_video_size_bytes: config.max_video_size_bytes,
            video_allowed_extensions: config.video_allowed_extensions.clone(),
            video_allowed_content_types: config.video_allowed_content_types.clone(),
            max_image_size_bytes: config.max_image_size_bytes,
            image_allowed_extensions: config.image_allowed_extensions.clone(),
            image_allowed_content_types: config.image_allowed_content_types.clone(),
        }
    }
}

/// Coordinates storage, translation, QR synthesis, and the metadata store.
///
/// Constructed once at process startup and injected into request handlers;
/// there are no module-level service globals.
pub struct UploadOrchestrator {
    storage: Arc<dyn Storage>,
    metastore: Arc<dyn MetadataStore>,
    translator: Arc<Translator>,
    qr_composer: QrComposer,
    probe: VideoProbe,
    config: OrchestratorConfig,
}

impl UploadOrchestrator {
    pub fn new(
        storage: Arc<dyn Storage>,
        metastore: Arc<dyn MetadataStore>,
        translator: Arc<Translator>,
        qr_composer: QrComposer,
        probe: VideoProbe,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            storage,
            metastore,
            translator,
            qr_composer,
            probe,
            config,
        }
    }

    fn video_validator(&self) -> MediaValidator {
        MediaValidator::new(
            self.config.max_video_size_bytes,
            self.config.video_allowed_extensions.clone(),
            self.config.video_allowed_content_types.clone(),
        )
    }

    fn image_validator(&self) -> MediaValidator {
        MediaValidator::new(
            self.config.max_image_size_bytes,
            self.config.image_allowed_extensions.clone(),
            self.config.image_allowed_content_types.clone(),
        )
    }

    /// Create a new entity: upload video (+ optional thumbnail), synthesize
    /// the composite QR, and persist everything as one metadata batch.
    pub async fn create_entity(
        &self,
        request: NewEntityRequest,
        progress: Option<ProgressFn>,
    ) -> Result<UploadOutcome, AppError> {
        let report = |pct: u8, message: &str| {
            if let Some(cb) = &progress {
                cb(pct, message);
            }
        };

        report(5, "Validating input files");
        if request.title.trim().is_empty() {
            return Err(AppError::InvalidInput("Title is required".to_string()));
        }

        let video_ext = media_types::file_extension(&request.video_filename).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Missing file extension: {}",
                request.video_filename
            ))
        })?;
        let video_content_type = media_types::video_content_type(&video_ext).to_string();
        let video_size = file_size(&request.video_path).await?;
        self.video_validator()
            .validate_all(&request.video_filename, &video_content_type, video_size)?;

        let thumbnail_ext = match (&request.thumbnail_path, &request.thumbnail_filename) {
            (Some(path), Some(filename)) => {
                let ext = media_types::file_extension(filename).ok_or_else(|| {
                    AppError::InvalidInput(format!("Missing file extension: {}", filename))
                })?;
                let content_type = media_types::image_content_type(&ext);
                let size = file_size(path).await?;
                self.image_validator()
                    .validate_all(filename, content_type, size)?;
                Some(ext)
            }
            _ => None,
        };

        report(10, "Extracting video metadata");
        let metadata = self.probe.probe_or_default(&request.video_path).await;

        let entity_id = Uuid::new_v4();
        let created_at = Utc::now();
        let base_folder = derive_base_folder(entity_id, created_at, &request.title);
        let watch_link = format!(
            "{}/watch/{}",
            self.config.public_base_url.trim_end_matches('/'),
            entity_id.simple()
        );

        report(12, "Translating title");
        let translations = self.translator.translate_title(&request.title).await;
        let korean_name = translations
            .get(&Language::Ko)
            .cloned()
            .unwrap_or_else(|| make_filename_safe(&request.title));

        report(15, "Uploading video");
        let video_key = derive_object_key(
            &base_folder,
            &korean_name,
            AssetRole::Video,
            Some(Language::Ko),
            &video_ext,
        );
        self.storage
            .put_file(
                &request.video_path,
                &video_key,
                &video_content_type,
                ranged_progress(progress.clone(), 15, 75, "Uploading video"),
            )
            .await
            .map_err(|e| {
                tracing::error!(
                    entity_id = %entity_id,
                    stage = "video_upload",
                    key = %video_key,
                    error = %e,
                    "Mandatory video upload failed"
                );
                AppError::from(e)
            })?;
        let video_url = proxy_url(&self.config.public_base_url, "video", &video_key);

        report(75, "Processing thumbnail");
        let thumbnail_ref = match (&request.thumbnail_path, thumbnail_ext) {
            (Some(path), Some(ext)) => {
                let key = derive_object_key(
                    &base_folder,
                    &korean_name,
                    AssetRole::Thumbnail,
                    None,
                    &ext,
                );
                let content_type = media_types::image_content_type(&ext);
                match self.storage.put_file(path, &key, content_type, None).await {
                    Ok(()) => Some(StorageRef {
                        url: proxy_url(&self.config.public_base_url, "thumbnail", &key),
                        key,
                    }),
                    Err(e) => {
                        tracing::warn!(
                            entity_id = %entity_id,
                            stage = "thumbnail_upload",
                            error = %e,
                            "Thumbnail upload failed, continuing without thumbnail"
                        );
                        None
                    }
                }
            }
            _ => None,
        };

        report(85, "Composing QR code");
        let qr_ref = self
            .compose_and_store_qr(
                entity_id,
                &base_folder,
                &korean_name,
                &watch_link,
                &request,
            )
            .await;

        report(95, "Persisting metadata");
        let variant = LanguageVariant {
            language: Language::Ko,
            video: StorageRef {
                key: video_key,
                url: video_url.clone(),
            },
            content_type: video_content_type,
            metadata: metadata.clone(),
            is_original: true,
            uploaded_at: created_at,
        };
        let entity = Entity {
            id: entity_id,
            title: request.title.clone(),
            description: request.description.clone(),
            category_path: request.category_path.clone(),
            base_folder,
            watch_link: watch_link.clone(),
            qr: qr_ref.clone(),
            thumbnail: thumbnail_ref.clone(),
            variants: BTreeMap::from([(Language::Ko, variant)]),
            tags: extract_tags(&request.description),
            total_file_size: metadata.file_size,
            created_at,
            updated_at: created_at,
        };

        self.metastore
            .create_entity(entity, TranslationRecord::new(translations))
            .await
            .map_err(|e| {
                tracing::error!(
                    entity_id = %entity_id,
                    stage = "metadata_batch",
                    error = %e,
                    "Entity metadata batch failed; storage objects remain as orphans"
                );
                AppError::from(e)
            })?;

        report(100, "Upload complete");
        tracing::info!(
            entity_id = %entity_id,
            watch_link = %watch_link,
            size_bytes = metadata.file_size,
            "Entity created"
        );

        Ok(UploadOutcome {
            entity_id,
            watch_link,
            video_url,
            qr_url: qr_ref.map(|r| r.url),
            thumbnail_url: thumbnail_ref.map(|r| r.url),
            metadata,
        })
    }

    /// Attach (or replace) one language variant of an existing entity.
    ///
    /// Idempotent per `(entity_id, language)`: re-attaching overwrites the
    /// previous variant's storage key and metadata. Two concurrent attaches
    /// for the same entity and language race; the upsert is last-write-wins
    /// and no serialization is assumed.
    pub async fn attach_language(
        &self,
        entity_id: Uuid,
        language: Language,
        video_path: &Path,
        video_filename: &str,
        progress: Option<ProgressFn>,
    ) -> Result<AttachOutcome, AppError> {
        let report = |pct: u8, message: &str| {
            if let Some(cb) = &progress {
                cb(pct, message);
            }
        };

        report(10, "Loading entity");
        let entity = self
            .metastore
            .get_entity(entity_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(format!("Entity not found: {}", entity_id)))?;

        let video_ext = media_types::file_extension(video_filename).ok_or_else(|| {
            AppError::InvalidInput(format!("Missing file extension: {}", video_filename))
        })?;
        let video_content_type = media_types::video_content_type(&video_ext).to_string();
        let video_size = file_size(video_path).await?;
        self.video_validator()
            .validate_all(video_filename, &video_content_type, video_size)?;

        report(20, "Preparing language variant");
        let translated_name = match self.metastore.get_translations(entity_id).await {
            Ok(Some(record)) => record
                .filename_for(language)
                .map(|s| s.to_string())
                .unwrap_or_else(|| make_filename_safe(&entity.title)),
            Ok(None) => make_filename_safe(&entity.title),
            Err(e) => {
                tracing::warn!(
                    entity_id = %entity_id,
                    error = %e,
                    "Translation record unavailable, naming from original title"
                );
                make_filename_safe(&entity.title)
            }
        };

        let metadata = self.probe.probe_or_default(video_path).await;

        report(40, "Uploading language video");
        let video_key = derive_object_key(
            &entity.base_folder,
            &translated_name,
            AssetRole::Video,
            Some(language),
            &video_ext,
        );
        self.storage
            .put_file(
                video_path,
                &video_key,
                &video_content_type,
                ranged_progress(progress.clone(), 40, 80, "Uploading language video"),
            )
            .await
            .map_err(|e| {
                tracing::error!(
                    entity_id = %entity_id,
                    language = %language,
                    stage = "language_video_upload",
                    key = %video_key,
                    error = %e,
                    "Language video upload failed"
                );
                AppError::from(e)
            })?;
        let video_url = proxy_url(&self.config.public_base_url, "video", &video_key);

        report(90, "Updating metadata");
        let variant = LanguageVariant {
            language,
            video: StorageRef {
                key: video_key,
                url: video_url.clone(),
            },
            content_type: video_content_type,
            metadata: metadata.clone(),
            is_original: false,
            uploaded_at: Utc::now(),
        };
        self.metastore
            .upsert_variant(entity_id, variant)
            .await
            .map_err(AppError::from)?;

        report(100, "Language upload complete");
        tracing::info!(
            entity_id = %entity_id,
            language = %language,
            "Language variant attached"
        );

        Ok(AttachOutcome {
            language,
            video_url,
            metadata,
        })
    }

    /// Compose and upload the QR asset. Never fatal: either composition or
    /// upload failure yields `None` and the entity ships without a QR.
    async fn compose_and_store_qr(
        &self,
        entity_id: Uuid,
        base_folder: &str,
        korean_name: &str,
        watch_link: &str,
        request: &NewEntityRequest,
    ) -> Option<StorageRef> {
        let caption = if request.category_path.trim().is_empty() {
            request.title.clone()
        } else {
            format!("{} ({})", request.title, request.category_path)
        };

        let thumbnail_bytes = match &request.thumbnail_path {
            Some(path) => tokio::fs::read(path).await.ok(),
            None => None,
        };

        let png = match self.qr_composer.compose(
            watch_link,
            Some(&caption),
            thumbnail_bytes.as_deref(),
        ) {
            Ok(png) => png,
            Err(e) => {
                tracing::warn!(
                    entity_id = %entity_id,
                    stage = "qr_compose",
                    error = %e,
                    "QR composition failed, continuing without QR asset"
                );
                return None;
            }
        };

        let key = derive_object_key(base_folder, korean_name, AssetRole::QrCombined, None, "png");
        match self.storage.put_bytes(&key, "image/png", Bytes::from(png)).await {
            Ok(()) => Some(StorageRef {
                url: proxy_url(&self.config.public_base_url, "qr", &key),
                key,
            }),
            Err(e) => {
                tracing::warn!(
                    entity_id = %entity_id,
                    stage = "qr_upload",
                    error = %e,
                    "QR upload failed, continuing without QR asset"
                );
                None
            }
        }
    }
}

async fn file_size(path: &Path) -> Result<usize, AppError> {
    Ok(tokio::fs::metadata(path)
        .await
        .map_err(|e| AppError::InvalidInput(format!("File unreadable: {}", e)))?
        .len() as usize)
}

/// Map byte-level storage progress onto a percent window of the overall flow.
fn ranged_progress(
    progress: Option<ProgressFn>,
    from: u8,
    to: u8,
    message: &'static str,
) -> Option<polyvid_storage::ProgressFn> {
    progress.map(|cb| {
        let span = to.saturating_sub(from);
        Arc::new(move |transferred: u64, total: u64| {
            let pct = if total == 0 {
                from
            } else {
                let fraction = transferred as f64 / total as f64;
                from + (fraction * span as f64).min(span as f64) as u8
            };
            cb(pct, message);
        }) as polyvid_storage::ProgressFn
    })
}
