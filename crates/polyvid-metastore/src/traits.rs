//! Metadata store abstraction trait

use async_trait::async_trait;
use polyvid_core::models::{Entity, LanguageVariant, TranslationRecord};
use thiserror::Error;
use uuid::Uuid;

/// Metadata store operation errors
#[derive(Debug, Error)]
pub enum MetastoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Metadata store unavailable: {0}")]
    Unavailable(String),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<MetastoreError> for polyvid_core::AppError {
    fn from(err: MetastoreError) -> Self {
        use polyvid_core::AppError;
        match err {
            MetastoreError::NotFound(id) => AppError::NotFound(format!("Entity not found: {}", id)),
            MetastoreError::Unavailable(msg) => AppError::ServiceUnavailable(msg),
            other => AppError::Metadata(other.to_string()),
        }
    }
}

/// Result type for metadata store operations
pub type MetastoreResult<T> = Result<T, MetastoreError>;

/// Document-oriented metadata store.
///
/// The entity document embeds its language-variant subrecords and the
/// translation record written at creation time. Batched operations are
/// atomic: either the whole write lands or none of it does.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Load an entity with all its language variants.
    async fn get_entity(&self, id: Uuid) -> MetastoreResult<Option<Entity>>;

    /// Load the translation record written when the entity was created.
    async fn get_translations(&self, id: Uuid) -> MetastoreResult<Option<TranslationRecord>>;

    /// Persist a new entity, its first language variant (already present in
    /// `entity.variants`), and its translation record as one atomic batch.
    async fn create_entity(
        &self,
        entity: Entity,
        translations: TranslationRecord,
    ) -> MetastoreResult<()>;

    /// Upsert a language variant and refresh the parent document
    /// (language set, total size, `updated_at`) in one atomic batch.
    ///
    /// Re-attaching an existing language overwrites that variant; the set of
    /// languages never shrinks through this call.
    async fn upsert_variant(
        &self,
        entity_id: Uuid,
        variant: LanguageVariant,
    ) -> MetastoreResult<()>;

    /// Most recently created entities, newest first, capped at `limit`.
    async fn list_entities(&self, limit: usize) -> MetastoreResult<Vec<Entity>>;

    /// Delete an entity and all its subrecords; returns the deleted document
    /// so callers can clean up its storage objects.
    async fn delete_entity(&self, id: Uuid) -> MetastoreResult<Option<Entity>>;
}
