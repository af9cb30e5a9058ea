//! Error types module
//!
//! Three layers of failure flow through a submission:
//! - [`ValidationError`](crate::validation::ValidationError): the file was refused locally.
//! - [`TransportError`]: what the network layer observed. Never shown to callers.
//! - [`ClassifiedError`]: the user-facing verdict produced by the classifier.
//!
//! [`SubmissionError`] is what the orchestrator returns: either a local rejection
//! or a classified transport failure.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::validation::ValidationError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for conditions the user can act on
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Self-description of a user-facing error.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "RATE_LIMITED")
    fn error_code(&self) -> &'static str;

    /// Whether offering a retry makes sense
    fn is_retriable(&self) -> bool;

    /// Message to show the user
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Failure observed by the transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Request exceeded its deadline of {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Request was cancelled")]
    Aborted,

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Server responded with status {status}")]
    HttpStatus {
        status: u16,
        /// `detail` field of the error body, when present.
        detail: Option<String>,
    },

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            TransportError::HttpStatus { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    RateLimited,
    Timeout,
    PayloadTooLarge,
    ServerDetail,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::RateLimited => "RATE_LIMITED",
            ErrorCategory::Timeout => "TIMEOUT",
            ErrorCategory::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorCategory::ServerDetail => "SERVER_DETAIL",
            ErrorCategory::Unknown => "UNKNOWN",
        }
    }
}

impl Display for ErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Final, user-facing description of a failed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub message: String,
    pub retriable: bool,
}

impl ClassifiedError {
    pub fn new(category: ErrorCategory, message: impl Into<String>, retriable: bool) -> Self {
        Self {
            category,
            message: message.into(),
            retriable,
        }
    }
}

impl ErrorMetadata for ClassifiedError {
    fn error_code(&self) -> &'static str {
        self.category.as_str()
    }

    fn is_retriable(&self) -> bool {
        self.retriable
    }

    fn client_message(&self) -> String {
        self.message.clone()
    }

    fn log_level(&self) -> LogLevel {
        match self.category {
            ErrorCategory::RateLimited | ErrorCategory::Timeout => LogLevel::Warn,
            ErrorCategory::PayloadTooLarge => LogLevel::Debug,
            ErrorCategory::ServerDetail | ErrorCategory::Unknown => LogLevel::Error,
        }
    }
}

/// Why a submission ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    /// Refused before any network activity.
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    /// Upload or analysis failed; already classified.
    #[error(transparent)]
    Failed(#[from] ClassifiedError),

    /// A submission was started on an orchestrator that is not idle.
    #[error("A submission is already {0}; reset before submitting again")]
    NotIdle(crate::models::SubmissionState),
}

impl SubmissionError {
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            SubmissionError::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl ErrorMetadata for SubmissionError {
    fn error_code(&self) -> &'static str {
        match self {
            SubmissionError::Rejected(err) => err.error_code(),
            SubmissionError::Failed(err) => err.error_code(),
            SubmissionError::NotIdle(_) => "NOT_IDLE",
        }
    }

    fn is_retriable(&self) -> bool {
        match self {
            SubmissionError::Rejected(err) => err.is_retriable(),
            SubmissionError::Failed(err) => err.is_retriable(),
            SubmissionError::NotIdle(_) => false,
        }
    }

    fn client_message(&self) -> String {
        match self {
            SubmissionError::Rejected(err) => err.client_message(),
            SubmissionError::Failed(err) => err.client_message(),
            SubmissionError::NotIdle(_) => self.to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            SubmissionError::Rejected(err) => err.log_level(),
            SubmissionError::Failed(err) => err.log_level(),
            SubmissionError::NotIdle(_) => LogLevel::Warn,
        }
    }
}
