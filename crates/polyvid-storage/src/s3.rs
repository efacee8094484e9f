//! S3-compatible storage backend over `object_store`.

use crate::traits::{
    validate_key, ByteStream, ObjectMetadata, ProgressFn, Storage, StorageError, StorageResult,
};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, Attributes, Error as ObjectStoreError, GetOptions, GetRange, ObjectStore,
    ObjectStoreExt, PutOptions, PutPayload, WriteMultipart,
};
use polyvid_core::media_types;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Objects are immutable once written; the proxy is the cache boundary, so
/// browsers and CDNs may hold them for a year.
const CACHE_CONTROL_LONG: &str = "public, max-age=31536000, immutable";

/// Files above this size are uploaded with multipart transfer.
const MULTIPART_THRESHOLD_BYTES: u64 = 20 * 1024 * 1024;
/// Part size for multipart transfers.
const MULTIPART_CHUNK_BYTES: usize = 8 * 1024 * 1024;
/// In-flight part bound; kept small for constrained hosts.
const MULTIPART_MAX_CONCURRENCY: usize = 2;

/// S3 storage implementation
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - region identifier (or the provider's equivalent)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO, "https://s3.us-east-1.wasabisys.com" for Wasabi)
    pub fn new(
        bucket: String,
        region: Option<String>,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Build AmazonS3 object store from environment and explicit settings.
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket.clone());

        if let Some(region) = region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage { store, bucket })
    }

    fn write_attributes(content_type: &str) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        attributes.insert(Attribute::CacheControl, CACHE_CONTROL_LONG.into());
        attributes
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put_file(
        &self,
        local_path: &Path,
        key: &str,
        content_type: &str,
        progress: Option<ProgressFn>,
    ) -> StorageResult<()> {
        validate_key(key)?;
        let start = std::time::Instant::now();
        let total = tokio::fs::metadata(local_path).await?.len();

        if total <= MULTIPART_THRESHOLD_BYTES {
            let data = tokio::fs::read(local_path).await?;
            self.put_bytes(key, content_type, Bytes::from(data)).await?;
            if let Some(cb) = progress {
                cb(total, total);
            }
            return Ok(());
        }

        let location = ObjectPath::from(key.to_string());
        let upload = self.store.put_multipart(&location).await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                "S3 multipart initiation failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        let mut write = WriteMultipart::new_with_chunk_size(upload, MULTIPART_CHUNK_BYTES);
        let mut file = tokio::fs::File::open(local_path).await?;
        let mut buf = vec![0u8; 1024 * 1024];
        let mut transferred: u64 = 0;

        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            write
                .wait_for_capacity(MULTIPART_MAX_CONCURRENCY)
                .await
                .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
            write.write(&buf[..n]);
            transferred += n as u64;
            if let Some(cb) = progress.as_ref() {
                cb(transferred, total);
            }
        }

        write.finish().await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = total,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 multipart upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = total,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 multipart upload successful"
        );

        Ok(())
    }

    async fn put_bytes(&self, key: &str, content_type: &str, data: Bytes) -> StorageResult<()> {
        validate_key(key)?;
        let size = data.len() as u64;
        let location = ObjectPath::from(key.to_string());
        let start = std::time::Instant::now();

        let opts = PutOptions {
            attributes: Self::write_attributes(content_type),
            ..Default::default()
        };

        self.store
            .put_opts(&location, PutPayload::from(data), opts)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn download(&self, key: &str) -> StorageResult<Bytes> {
        validate_key(key)?;
        let start = std::time::Instant::now();
        let location = ObjectPath::from(key.to_string());

        let result = self.store.get(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %key,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes)
    }

    async fn download_stream(&self, key: &str) -> StorageResult<ByteStream> {
        validate_key(key)?;
        let location = ObjectPath::from(key.to_string());

        let result = self.store.get(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        let stream = result
            .into_stream()
            .map(|res| res.map_err(|e| StorageError::DownloadFailed(e.to_string())));

        Ok(Box::pin(stream))
    }

    async fn get_range(&self, key: &str, start: u64, end: u64) -> StorageResult<ByteStream> {
        validate_key(key)?;
        let location = ObjectPath::from(key.to_string());

        let opts = GetOptions {
            range: Some(GetRange::Bounded(start..end + 1)),
            ..Default::default()
        };

        let result = self
            .store
            .get_opts(&location, opts)
            .await
            .map_err(|e| match e {
                ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
                other => {
                    let message = other.to_string();
                    if message.contains("range") || message.contains("Range") {
                        StorageError::RangeNotSatisfiable {
                            key: key.to_string(),
                            start,
                            end,
                            length: 0,
                        }
                    } else {
                        StorageError::DownloadFailed(message)
                    }
                }
            })?;

        let stream = result
            .into_stream()
            .map(|res| res.map_err(|e| StorageError::DownloadFailed(e.to_string())));

        Ok(Box::pin(stream))
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectMetadata> {
        validate_key(key)?;
        let location = ObjectPath::from(key.to_string());

        // head via get_opts so the stored content-type attribute is returned
        let opts = GetOptions {
            head: true,
            ..Default::default()
        };

        let result = self
            .store
            .get_opts(&location, opts)
            .await
            .map_err(|e| match e {
                ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
                other => StorageError::BackendError(other.to_string()),
            })?;

        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.to_string())
            .unwrap_or_else(|| media_types::guess_content_type(key).to_string());

        Ok(ObjectMetadata {
            content_type,
            length: result.meta.size,
            etag: result.meta.e_tag.clone().unwrap_or_default(),
        })
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let location = ObjectPath::from(key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let start = std::time::Instant::now();
        let location = ObjectPath::from(key.to_string());

        self.store.delete(&location).await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                "S3 delete failed"
            );
            StorageError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
