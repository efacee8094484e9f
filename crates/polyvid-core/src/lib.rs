//! Polyvid Core Library
//!
//! Shared foundation for the polyvid workspace: configuration, the unified
//! error type, domain models (entities, language variants, translation
//! records, watch resolution) and media-type tables.

pub mod config;
pub mod error;
pub mod media_types;
pub mod models;
pub mod storage_types;
pub mod urls;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
