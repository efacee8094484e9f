//! Domain models

pub mod entity;
pub mod language;
pub mod translation;
pub mod watch;

pub use entity::{Entity, LanguageVariant, StorageRef, VideoTechMetadata};
pub use language::Language;
pub use translation::TranslationRecord;
pub use watch::WatchResolution;
