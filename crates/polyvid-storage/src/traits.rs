//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must
//! implement. The upload orchestrator and the proxy server only talk to this
//! trait, so the bucket provider stays a configuration concern.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Range not satisfiable for {key}: {start}-{end} of {length}")]
    RangeNotSatisfiable {
        key: String,
        start: u64,
        end: u64,
        length: u64,
    },

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<StorageError> for polyvid_core::AppError {
    fn from(err: StorageError) -> Self {
        use polyvid_core::AppError;
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Object not found: {}", key)),
            StorageError::RangeNotSatisfiable {
                key,
                start,
                end,
                length,
            } => AppError::RangeNotSatisfiable(format!(
                "{}-{} of {} for {}",
                start, end, length, key
            )),
            StorageError::InvalidKey(key) => {
                AppError::InvalidInput(format!("Invalid storage key: {}", key))
            }
            StorageError::IoError(e) => AppError::Internal(format!("IO error: {}", e)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked object body; chunks are bounded by the backend transport.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Progress callback for large uploads: `(bytes_transferred, total_bytes)`.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// HEAD-style object metadata used by the range-aware video route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_type: String,
    pub length: u64,
    pub etag: String,
}

/// Storage abstraction trait
///
/// All storage backends (S3-compatible, in-memory) must implement this trait.
/// Keys follow the deterministic format documented at the crate root.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload a local file under `key`.
    ///
    /// Large files use multipart transfer with bounded concurrency; progress
    /// is reported through `progress` as `(bytes_transferred, total)`.
    /// Aborting the call aborts the transfer at the transport layer.
    async fn put_file(
        &self,
        local_path: &Path,
        key: &str,
        content_type: &str,
        progress: Option<ProgressFn>,
    ) -> StorageResult<()>;

    /// Upload an in-memory payload under `key` (QR images, thumbnails).
    async fn put_bytes(&self, key: &str, content_type: &str, data: Bytes) -> StorageResult<()>;

    /// Download a full object into memory. Only for cache-sized assets.
    async fn download(&self, key: &str) -> StorageResult<Bytes>;

    /// Download a full object as a chunked stream (for large payloads).
    async fn download_stream(&self, key: &str) -> StorageResult<ByteStream>;

    /// Download the inclusive byte span `start..=end` as a chunked stream.
    ///
    /// Callers are expected to validate the span against `head` first; the
    /// backend still rejects spans beyond the object length.
    async fn get_range(&self, key: &str, start: u64, end: u64) -> StorageResult<ByteStream>;

    /// Object metadata (content type, byte length, ETag) without the body.
    async fn head(&self, key: &str) -> StorageResult<ObjectMetadata>;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Delete an object by key.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Reject keys that could escape the bucket namespace.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|seg| seg == "..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("videos/2025/08/a_b/ok.mp4").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/leading/slash").is_err());
        assert!(validate_key("videos/../secrets").is_err());
    }
}
