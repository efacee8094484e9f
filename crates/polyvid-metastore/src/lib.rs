//! Polyvid Metadata Store Library
//!
//! Document-oriented metadata persistence for entities, their per-language
//! video variants, and translation records. The `MetadataStore` trait is the
//! seam for Firestore-style backends; the in-memory implementation backs
//! tests and local development.
//!
//! Write atomicity: `create_entity` and `upsert_variant` are single atomic
//! batches. The parent document and its per-language subrecord are never
//! visible in a half-written state.

pub mod memory;
pub mod traits;

pub use memory::MemoryMetadataStore;
pub use traits::{MetadataStore, MetastoreError, MetastoreResult};
