use polyvid_core::{media_types, AppError};
use std::path::Path;

/// Common validation errors for media files
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Missing file extension: {0}")]
    MissingExtension(String),

    #[error("Empty file")]
    EmptyFile,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { size, max } => AppError::PayloadTooLarge(format!(
                "{} bytes exceeds max {} bytes",
                size, max
            )),
            other => AppError::InvalidInput(other.to_string()),
        }
    }
}

/// Media file validator
///
/// Validation runs before any storage or metadata I/O; a rejected file never
/// reaches the object store.
pub struct MediaValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl MediaValidator {
    pub fn new(
        max_file_size: usize,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
            allowed_content_types,
        }
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate file extension
    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| ValidationError::MissingExtension(filename.to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(())
    }

    /// Validate content type
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.to_lowercase();

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate that Content-Type matches the file extension.
    /// Prevents spoofed uploads where a disallowed payload carries an
    /// allowed Content-Type.
    pub fn validate_extension_content_type_match(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| ValidationError::MissingExtension(filename.to_string()))?;

        let normalized_content_type = content_type.to_lowercase();

        let expected: &str = match extension.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "bmp" => {
                media_types::image_content_type(&extension)
            }
            "mp4" | "avi" | "mov" | "wmv" | "webm" | "mkv" | "flv" => {
                media_types::video_content_type(&extension)
            }
            _ => {
                // Unknown extensions skip cross-validation; extension and
                // content-type are still validated individually.
                tracing::debug!(
                    extension = %extension,
                    content_type = %content_type,
                    "Unknown extension, skipping Content-Type/extension cross-validation"
                );
                return Ok(());
            }
        };

        if expected != normalized_content_type {
            return Err(ValidationError::InvalidContentType {
                content_type: format!(
                    "{} (does not match extension '{}'. Expected: {})",
                    content_type, extension, expected
                ),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate all aspects of a file, including Content-Type/extension matching
    pub fn validate_all(
        &self,
        filename: &str,
        content_type: &str,
        file_size: usize,
    ) -> Result<(), ValidationError> {
        self.validate_file_size(file_size)?;
        self.validate_extension(filename)?;
        self.validate_content_type(content_type)?;
        self.validate_extension_content_type_match(filename, content_type)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_validator() -> MediaValidator {
        MediaValidator::new(
            10 * 1024 * 1024,
            vec!["mp4".to_string(), "webm".to_string()],
            vec!["video/mp4".to_string(), "video/webm".to_string()],
        )
    }

    fn image_validator() -> MediaValidator {
        MediaValidator::new(
            1024 * 1024,
            vec!["jpg".to_string(), "png".to_string()],
            vec!["image/jpeg".to_string(), "image/png".to_string()],
        )
    }

    #[test]
    fn test_validate_file_size_ok() {
        assert!(video_validator().validate_file_size(512 * 1024).is_ok());
    }

    #[test]
    fn test_validate_file_size_too_large() {
        let err = video_validator()
            .validate_file_size(20 * 1024 * 1024)
            .unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { .. }));
    }

    #[test]
    fn test_validate_file_size_empty() {
        assert!(matches!(
            video_validator().validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_validate_extension_case_insensitive() {
        assert!(video_validator().validate_extension("lecture.MP4").is_ok());
        assert!(video_validator().validate_extension("lecture.avi").is_err());
    }

    #[test]
    fn test_validate_extension_missing() {
        assert!(matches!(
            video_validator().validate_extension("noextension"),
            Err(ValidationError::MissingExtension(_))
        ));
    }

    #[test]
    fn test_validate_content_type() {
        assert!(video_validator().validate_content_type("video/mp4").is_ok());
        assert!(video_validator()
            .validate_content_type("VIDEO/WEBM")
            .is_ok());
        assert!(video_validator()
            .validate_content_type("video/x-flv")
            .is_err());
    }

    #[test]
    fn test_cross_validation_catches_mismatch() {
        assert!(video_validator()
            .validate_extension_content_type_match("a.mp4", "video/mp4")
            .is_ok());
        assert!(video_validator()
            .validate_extension_content_type_match("a.mp4", "video/webm")
            .is_err());
        assert!(image_validator()
            .validate_extension_content_type_match("a.png", "image/jpeg")
            .is_err());
    }

    #[test]
    fn test_cross_validation_skips_unknown_extension() {
        assert!(video_validator()
            .validate_extension_content_type_match("a.xyz", "application/xyz")
            .is_ok());
    }

    #[test]
    fn test_validate_all() {
        assert!(video_validator()
            .validate_all("lecture.mp4", "video/mp4", 1024)
            .is_ok());
        assert!(video_validator()
            .validate_all("lecture.gif", "image/gif", 1024)
            .is_err());
    }

    #[test]
    fn test_validation_error_to_app_error() {
        let app: AppError = ValidationError::FileTooLarge { size: 10, max: 5 }.into();
        assert!(matches!(app, AppError::PayloadTooLarge(_)));
        let app: AppError = ValidationError::EmptyFile.into();
        assert!(matches!(app, AppError::InvalidInput(_)));
    }
}
