//! In-memory metadata store for tests and local development.
//!
//! A single `RwLock` write section makes every batched operation atomic.

use crate::traits::{MetadataStore, MetastoreError, MetastoreResult};
use async_trait::async_trait;
use chrono::Utc;
use polyvid_core::models::{Entity, LanguageVariant, TranslationRecord};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct EntityDocument {
    entity: Entity,
    translations: TranslationRecord,
}

/// In-memory metadata store implementation.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataStore {
    documents: Arc<RwLock<HashMap<Uuid, EntityDocument>>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> MetastoreResult<std::sync::RwLockReadGuard<'_, HashMap<Uuid, EntityDocument>>> {
        self.documents
            .read()
            .map_err(|_| MetastoreError::Unavailable("document lock poisoned".to_string()))
    }

    fn write(
        &self,
    ) -> MetastoreResult<std::sync::RwLockWriteGuard<'_, HashMap<Uuid, EntityDocument>>> {
        self.documents
            .write()
            .map_err(|_| MetastoreError::Unavailable("document lock poisoned".to_string()))
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn get_entity(&self, id: Uuid) -> MetastoreResult<Option<Entity>> {
        Ok(self.read()?.get(&id).map(|doc| doc.entity.clone()))
    }

    async fn get_translations(&self, id: Uuid) -> MetastoreResult<Option<TranslationRecord>> {
        Ok(self.read()?.get(&id).map(|doc| doc.translations.clone()))
    }

    async fn create_entity(
        &self,
        entity: Entity,
        translations: TranslationRecord,
    ) -> MetastoreResult<()> {
        let mut documents = self.write()?;
        if documents.contains_key(&entity.id) {
            return Err(MetastoreError::Conflict(format!(
                "entity {} already exists",
                entity.id
            )));
        }
        tracing::debug!(entity_id = %entity.id, "Persisting entity batch");
        documents.insert(
            entity.id,
            EntityDocument {
                entity,
                translations,
            },
        );
        Ok(())
    }

    async fn upsert_variant(
        &self,
        entity_id: Uuid,
        mut variant: LanguageVariant,
    ) -> MetastoreResult<()> {
        let mut documents = self.write()?;
        let doc = documents
            .get_mut(&entity_id)
            .ok_or_else(|| MetastoreError::NotFound(entity_id.to_string()))?;

        let language = variant.language;
        // The original flag is set at creation and never reassigned;
        // re-uploading the original language keeps it
        if let Some(existing) = doc.entity.variants.get(&language) {
            variant.is_original = existing.is_original;
        }
        let previous = doc.entity.variants.insert(language, variant);
        doc.entity.total_file_size = doc
            .entity
            .variants
            .values()
            .map(|v| v.metadata.file_size)
            .sum();
        doc.entity.updated_at = Utc::now();

        tracing::debug!(
            entity_id = %entity_id,
            language = %language,
            replaced = previous.is_some(),
            "Upserted language variant"
        );
        Ok(())
    }

    async fn list_entities(&self, limit: usize) -> MetastoreResult<Vec<Entity>> {
        let documents = self.read()?;
        let mut entities: Vec<Entity> = documents.values().map(|d| d.entity.clone()).collect();
        entities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entities.truncate(limit);
        Ok(entities)
    }

    async fn delete_entity(&self, id: Uuid) -> MetastoreResult<Option<Entity>> {
        Ok(self.write()?.remove(&id).map(|doc| doc.entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyvid_core::models::{Language, StorageRef, VideoTechMetadata};
    use std::collections::BTreeMap;

    fn variant(language: Language, is_original: bool, size: i64) -> LanguageVariant {
        LanguageVariant {
            language,
            video: StorageRef {
                key: format!("videos/x/v_{}.mp4", language),
                url: format!("http://localhost:8080/video/v_{}", language),
            },
            content_type: "video/mp4".to_string(),
            metadata: VideoTechMetadata {
                file_size: size,
                ..VideoTechMetadata::zeroed(size)
            },
            is_original,
            uploaded_at: Utc::now(),
        }
    }

    fn entity(id: Uuid) -> Entity {
        let now = Utc::now();
        let mut variants = BTreeMap::new();
        variants.insert(Language::Ko, variant(Language::Ko, true, 100));
        Entity {
            id,
            title: "기초 안전교육".to_string(),
            description: "demo".to_string(),
            category_path: "장비/안전장비/헬멧".to_string(),
            base_folder: "videos/2025/08/x".to_string(),
            watch_link: "http://localhost:8080/watch/x".to_string(),
            qr: None,
            thumbnail: None,
            variants,
            tags: vec![],
            total_file_size: 100,
            created_at: now,
            updated_at: now,
        }
    }

    fn translations() -> TranslationRecord {
        TranslationRecord::new(BTreeMap::from([(Language::Ko, "기초_안전교육".to_string())]))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryMetadataStore::new();
        let id = Uuid::new_v4();
        store.create_entity(entity(id), translations()).await.unwrap();

        let loaded = store.get_entity(id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert!(loaded.variants.contains_key(&Language::Ko));
        assert!(store.get_translations(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_twice_conflicts() {
        let store = MemoryMetadataStore::new();
        let id = Uuid::new_v4();
        store.create_entity(entity(id), translations()).await.unwrap();
        let err = store
            .create_entity(entity(id), translations())
            .await
            .unwrap_err();
        assert!(matches!(err, MetastoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_upsert_variant_is_idempotent_per_language() {
        let store = MemoryMetadataStore::new();
        let id = Uuid::new_v4();
        store.create_entity(entity(id), translations()).await.unwrap();

        store
            .upsert_variant(id, variant(Language::En, false, 200))
            .await
            .unwrap();
        store
            .upsert_variant(id, variant(Language::En, false, 300))
            .await
            .unwrap();

        let loaded = store.get_entity(id).await.unwrap().unwrap();
        assert_eq!(loaded.variants.len(), 2);
        assert_eq!(
            loaded.variants.get(&Language::En).unwrap().metadata.file_size,
            300
        );
        // Parent aggregate reflects the second write, not both
        assert_eq!(loaded.total_file_size, 400);
    }

    #[tokio::test]
    async fn test_upsert_original_language_keeps_original_flag() {
        let store = MemoryMetadataStore::new();
        let id = Uuid::new_v4();
        store.create_entity(entity(id), translations()).await.unwrap();

        store
            .upsert_variant(id, variant(Language::Ko, false, 500))
            .await
            .unwrap();

        let loaded = store.get_entity(id).await.unwrap().unwrap();
        let ko = loaded.variants.get(&Language::Ko).unwrap();
        assert!(ko.is_original);
        assert_eq!(ko.metadata.file_size, 500);
    }

    #[tokio::test]
    async fn test_upsert_into_missing_entity() {
        let store = MemoryMetadataStore::new();
        let err = store
            .upsert_variant(Uuid::new_v4(), variant(Language::En, false, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, MetastoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_capped() {
        let store = MemoryMetadataStore::new();
        let mut ids = vec![];
        for _ in 0..5 {
            let id = Uuid::new_v4();
            let mut e = entity(id);
            e.created_at = Utc::now();
            store.create_entity(e, translations()).await.unwrap();
            ids.push(id);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let listed = store.list_entities(3).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].id, ids[4]);
    }

    #[tokio::test]
    async fn test_delete_returns_document() {
        let store = MemoryMetadataStore::new();
        let id = Uuid::new_v4();
        store.create_entity(entity(id), translations()).await.unwrap();

        let deleted = store.delete_entity(id).await.unwrap();
        assert!(deleted.is_some());
        assert!(store.get_entity(id).await.unwrap().is_none());
        assert!(store.delete_entity(id).await.unwrap().is_none());
    }
}
