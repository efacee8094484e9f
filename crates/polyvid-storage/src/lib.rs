//! Polyvid Storage Library
//!
//! Storage abstraction and backends for polyvid: the `Storage` trait, an
//! S3-compatible implementation over `object_store`, and an in-memory backend
//! for tests and local development.
//!
//! # Storage key format
//!
//! Keys are derived deterministically in the `keys` module:
//!
//! - Base folder: `videos/{yyyy}/{mm}/{entity_id}_{sanitized_title}`
//! - Object key: `{base_folder}/{translated_name}_{role}[_{lang}].{ext}`
//!
//! Keys must not contain `..` or a leading `/`; derivation sanitizes titles
//! before they become path segments, so retried uploads overwrite instead of
//! duplicating.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-memory")]
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{derive_base_folder, derive_object_key, sanitize_title, AssetRole};
#[cfg(feature = "storage-memory")]
pub use memory::MemoryStorage;
pub use polyvid_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteStream, ObjectMetadata, ProgressFn, Storage, StorageError, StorageResult};
