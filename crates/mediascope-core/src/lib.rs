//! Mediascope Core Library
//!
//! This crate provides the domain models, validation, timeout estimation,
//! progress reporting and error classification shared by the Mediascope
//! client and CLI. Nothing in here performs network I/O.

pub mod classifier;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod progress;
pub mod timeout;
pub mod validation;

// Re-export commonly used types
pub use classifier::{classify, ClassificationContext};
pub use config::ClientConfig;
pub use error::{
    ClassifiedError, ErrorCategory, ErrorMetadata, LogLevel, SubmissionError, TransportError,
};
pub use format::format_size;
pub use models::{
    AnalysisMode, AnalysisResult, FileSource, ImageResult, MediaConstraint, MediaConstraints,
    MediaFile, MediaKind, SubmissionState, UploadRequest, VideoResult, VideoSection,
};
pub use progress::{ProgressCallback, ProgressEvent, ProgressReporter};
pub use timeout::{estimate_timeout, timeout_minutes, TimeoutPolicy};
pub use validation::{validate, MediaValidator, ValidationError};
