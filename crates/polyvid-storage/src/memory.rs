//! In-memory storage backend for tests and local development.

use crate::traits::{
    validate_key, ByteStream, ObjectMetadata, ProgressFn, Storage, StorageError, StorageResult,
};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Stream chunk size; matches the bounded-chunk policy of the proxy.
const STREAM_CHUNK_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
    etag: String,
}

/// In-memory storage implementation.
///
/// Byte-accurate ranges and deterministic content-hash ETags make it a
/// faithful stand-in for the S3 backend in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn etag_for(data: &[u8]) -> String {
        let digest = Sha256::digest(data);
        format!("\"{}\"", hex::encode(&digest[..16]))
    }

    fn chunked_stream(data: Bytes) -> ByteStream {
        let chunks: Vec<StorageResult<Bytes>> = data
            .chunks(STREAM_CHUNK_BYTES)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Box::pin(futures::stream::iter(chunks))
    }

    fn get_object(&self, key: &str) -> StorageResult<StoredObject> {
        self.objects
            .read()
            .map_err(|_| StorageError::BackendError("storage lock poisoned".to_string()))?
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn insert(&self, key: &str, content_type: &str, data: Bytes) -> StorageResult<()> {
        let etag = Self::etag_for(&data);
        let mut objects = self
            .objects
            .write()
            .map_err(|_| StorageError::BackendError("storage lock poisoned".to_string()))?;
        objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
                etag,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put_file(
        &self,
        local_path: &Path,
        key: &str,
        content_type: &str,
        progress: Option<ProgressFn>,
    ) -> StorageResult<()> {
        validate_key(key)?;
        let data = tokio::fs::read(local_path).await?;
        let total = data.len() as u64;
        self.insert(key, content_type, Bytes::from(data))?;
        if let Some(cb) = progress {
            cb(total, total);
        }
        Ok(())
    }

    async fn put_bytes(&self, key: &str, content_type: &str, data: Bytes) -> StorageResult<()> {
        validate_key(key)?;
        self.insert(key, content_type, data)
    }

    async fn download(&self, key: &str) -> StorageResult<Bytes> {
        validate_key(key)?;
        Ok(self.get_object(key)?.data)
    }

    async fn download_stream(&self, key: &str) -> StorageResult<ByteStream> {
        validate_key(key)?;
        Ok(Self::chunked_stream(self.get_object(key)?.data))
    }

    async fn get_range(&self, key: &str, start: u64, end: u64) -> StorageResult<ByteStream> {
        validate_key(key)?;
        let object = self.get_object(key)?;
        let length = object.data.len() as u64;
        if start > end || end >= length {
            return Err(StorageError::RangeNotSatisfiable {
                key: key.to_string(),
                start,
                end,
                length,
            });
        }
        let span = object.data.slice(start as usize..=end as usize);
        Ok(Self::chunked_stream(span))
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectMetadata> {
        validate_key(key)?;
        let object = self.get_object(key)?;
        Ok(ObjectMetadata {
            content_type: object.content_type,
            length: object.data.len() as u64,
            etag: object.etag,
        })
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self
            .objects
            .read()
            .map_err(|_| StorageError::BackendError("storage lock poisoned".to_string()))?
            .contains_key(key))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let mut objects = self
            .objects
            .write()
            .map_err(|_| StorageError::BackendError("storage lock poisoned".to_string()))?;
        objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    async fn collect(stream: ByteStream) -> Vec<u8> {
        stream
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_and_head() {
        let storage = MemoryStorage::new();
        storage
            .put_bytes("videos/a/b.mp4", "video/mp4", Bytes::from(vec![7u8; 1000]))
            .await
            .unwrap();

        let meta = storage.head("videos/a/b.mp4").await.unwrap();
        assert_eq!(meta.length, 1000);
        assert_eq!(meta.content_type, "video/mp4");
        assert!(meta.etag.starts_with('"'));
    }

    #[tokio::test]
    async fn test_etag_is_content_derived() {
        let storage = MemoryStorage::new();
        storage
            .put_bytes("a", "video/mp4", Bytes::from_static(b"one"))
            .await
            .unwrap();
        storage
            .put_bytes("b", "video/mp4", Bytes::from_static(b"one"))
            .await
            .unwrap();
        storage
            .put_bytes("c", "video/mp4", Bytes::from_static(b"two"))
            .await
            .unwrap();

        let a = storage.head("a").await.unwrap().etag;
        let b = storage.head("b").await.unwrap().etag;
        let c = storage.head("c").await.unwrap().etag;
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_get_range_exact_span() {
        let storage = MemoryStorage::new();
        let data: Vec<u8> = (0u8..=255).cycle().take(4096).collect();
        storage
            .put_bytes("k", "application/octet-stream", Bytes::from(data.clone()))
            .await
            .unwrap();

        let got = collect(storage.get_range("k", 100, 199).await.unwrap()).await;
        assert_eq!(got.len(), 100);
        assert_eq!(got, &data[100..200]);
    }

    #[tokio::test]
    async fn test_get_range_beyond_length_rejected() {
        let storage = MemoryStorage::new();
        storage
            .put_bytes("k", "video/mp4", Bytes::from(vec![0u8; 100]))
            .await
            .unwrap();

        let Err(err) = storage.get_range("k", 100, 100).await else {
            panic!("expected error");
        };
        assert!(matches!(err, StorageError::RangeNotSatisfiable { .. }));
        let Err(err) = storage.get_range("k", 50, 20).await else {
            panic!("expected error");
        };
        assert!(matches!(err, StorageError::RangeNotSatisfiable { .. }));
    }

    #[tokio::test]
    async fn test_download_stream_roundtrip() {
        let storage = MemoryStorage::new();
        let data = vec![42u8; 3 * STREAM_CHUNK_BYTES + 17];
        storage
            .put_bytes("k", "video/mp4", Bytes::from(data.clone()))
            .await
            .unwrap();

        let got = collect(storage.download_stream("k").await.unwrap()).await;
        assert_eq!(got, data);
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let storage = MemoryStorage::new();
        assert!(matches!(
            storage.download("nope").await.unwrap_err(),
            StorageError::NotFound(_)
        ));
        assert!(!storage.exists("nope").await.unwrap());
    }
}
