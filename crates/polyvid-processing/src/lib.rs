//! Polyvid Processing Library
//!
//! Media-side building blocks for the upload flow: file validation, ffprobe
//! metadata extraction, composite QR synthesis, and the upload orchestrator
//! that ties storage, translation, and the metadata store together.

pub mod qr;
pub mod upload;
pub mod validator;
pub mod video;

pub use qr::QrComposer;
pub use upload::{
    AttachOutcome, NewEntityRequest, OrchestratorConfig, ProgressFn, UploadOrchestrator,
    UploadOutcome,
};
pub use validator::{MediaValidator, ValidationError};
pub use video::VideoProbe;
