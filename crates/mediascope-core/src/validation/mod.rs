//! Validation of user-selected files against a [`MediaConstraint`].
//!
//! Runs before any transport activity; a rejected file never reaches the network.

use crate::error::{ErrorMetadata, LogLevel};
use crate::format::format_size;
use crate::models::{MediaConstraint, MediaFile};

/// Why a file was refused before upload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid file type. Please upload: {}", join_subtypes(.accepted))]
    InvalidType {
        mime_type: String,
        /// Accepted MIME subtypes, e.g. `jpeg`.
        accepted: Vec<String>,
    },

    #[error("File too large. Maximum size is {}", format_max(.max))]
    TooLarge { size: u64, max: u64 },
}

fn join_subtypes(accepted: &[String]) -> String {
    accepted.join(", ")
}

fn format_max(max: &u64) -> String {
    format_size(*max)
}

impl ErrorMetadata for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            ValidationError::InvalidType { .. } => "INVALID_TYPE",
            ValidationError::TooLarge { .. } => "TOO_LARGE",
        }
    }

    fn is_retriable(&self) -> bool {
        false
    }

    fn client_message(&self) -> String {
        self.to_string()
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

/// Media file validator bound to one constraint.
pub struct MediaValidator<'a> {
    constraint: &'a MediaConstraint,
}

impl<'a> MediaValidator<'a> {
    pub fn new(constraint: &'a MediaConstraint) -> Self {
        Self { constraint }
    }

    /// Validate content type (case-insensitive).
    pub fn validate_content_type(&self, mime_type: &str) -> Result<(), ValidationError> {
        if !self.constraint.accepts_mime_type(mime_type) {
            return Err(ValidationError::InvalidType {
                mime_type: mime_type.to_string(),
                accepted: self
                    .constraint
                    .accepted_subtypes()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            });
        }

        Ok(())
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size > self.constraint.max_size_bytes {
            return Err(ValidationError::TooLarge {
                size,
                max: self.constraint.max_size_bytes,
            });
        }

        Ok(())
    }

    /// Type first, then size.
    pub fn validate(&self, file: &MediaFile) -> Result<(), ValidationError> {
        self.validate_content_type(file.mime_type())?;
        self.validate_file_size(file.size())?;
        Ok(())
    }
}

/// Check a file against a constraint.
pub fn validate(file: &MediaFile, constraint: &MediaConstraint) -> Result<(), ValidationError> {
    MediaValidator::new(constraint).validate(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaConstraints, IMAGE_MAX_SIZE_BYTES};

    fn sized_file(name: &str, mime: &str, size: usize) -> MediaFile {
        MediaFile::from_bytes(name, mime, vec![0u8; size])
    }

    #[test]
    fn test_accepts_valid_image() {
        let constraints = MediaConstraints::default();
        let file = sized_file("cat.png", "image/png", 1024);
        assert!(validate(&file, &constraints.image).is_ok());
    }

    #[test]
    fn test_invalid_type_lists_subtypes() {
        let constraints = MediaConstraints::default();
        let file = sized_file("doc.pdf", "application/pdf", 10);
        let err = validate(&file, &constraints.image).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidType { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid file type. Please upload: jpeg, png, gif"
        );
    }

    #[test]
    fn test_invalid_video_type_message() {
        let constraints = MediaConstraints::default();
        let file = sized_file("anim.gif", "image/gif", 10);
        let err = validate(&file, &constraints.video).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid file type. Please upload: mp4, quicktime, webm, avi"
        );

        let avi = sized_file("clip.avi", "video/x-msvideo", 10);
        assert!(validate(&avi, &constraints.video).is_ok());
    }

    #[test]
    fn test_content_type_is_case_insensitive() {
        let constraint = MediaConstraints::default().image;
        let validator = MediaValidator::new(&constraint);
        assert!(validator.validate_content_type("IMAGE/JPEG").is_ok());
    }

    #[test]
    fn test_too_large_reports_formatted_max() {
        let constraint = MediaConstraints::default().image;
        let validator = MediaValidator::new(&constraint);
        let err = validator
            .validate_file_size(IMAGE_MAX_SIZE_BYTES + 1)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLarge {
                size: IMAGE_MAX_SIZE_BYTES + 1,
                max: 20971520
            }
        );
        assert!(err.to_string().contains("20 MB"));
    }

    #[test]
    fn test_size_at_limit_is_accepted() {
        let constraint = MediaConstraints::default().image;
        let validator = MediaValidator::new(&constraint);
        assert!(validator.validate_file_size(IMAGE_MAX_SIZE_BYTES).is_ok());
        assert!(validator.validate_file_size(0).is_ok());
    }

    #[test]
    fn test_type_checked_before_size() {
        let constraint = MediaConstraint::new(
            crate::models::MediaKind::Image,
            vec!["image/png".to_string()],
            vec![],
            4,
        );
        let file = sized_file("a.bmp", "image/bmp", 100);
        assert!(matches!(
            validate(&file, &constraint),
            Err(ValidationError::InvalidType { .. })
        ));
    }

    #[test]
    fn test_validation_error_metadata() {
        let err = ValidationError::TooLarge { size: 2, max: 1 };
        assert_eq!(err.error_code(), "TOO_LARGE");
        assert!(!err.is_retriable());
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert_eq!(err.client_message(), "File too large. Maximum size is 1 Bytes");
    }
}
