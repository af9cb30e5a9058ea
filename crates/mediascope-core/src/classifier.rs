//! Maps transport failures to user-facing error categories.
//!
//! Rules are evaluated in order and the first match wins:
//! 429, deadline exceeded, 413, server `detail`, then everything else.

use std::time::Duration;

use crate::error::{ClassifiedError, ErrorCategory, TransportError};
use crate::format::format_size_compact;
use crate::models::{MediaConstraints, MediaKind};
use crate::timeout::timeout_minutes;

/// Videos above this size are steered towards the overview mode on timeout.
pub const LARGE_VIDEO_THRESHOLD_MB: f64 = 200.0;

const RATE_LIMITED_MESSAGE: &str =
    "The service is currently experiencing high demand. Please wait a few minutes and try again.";
const NO_RESPONSE_MESSAGE: &str =
    "No response from server. Please check your connection and try again.";

/// What the classifier needs to know about the failed submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationContext {
    pub kind: MediaKind,
    pub file_size_mb: f64,
    pub timeout: Duration,
    /// Ceiling named in the payload-too-large message.
    pub max_size_bytes: u64,
}

impl ClassificationContext {
    pub fn new(kind: MediaKind, file_size_bytes: u64, timeout: Duration) -> Self {
        Self {
            kind,
            file_size_mb: file_size_bytes as f64 / (1024.0 * 1024.0),
            timeout,
            max_size_bytes: MediaConstraints::default().for_kind(kind).max_size_bytes,
        }
    }

    pub fn with_max_size(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    fn failure_prefix(&self) -> &'static str {
        match self.kind {
            MediaKind::Image => "Failed to analyze image.",
            MediaKind::Video => "Failed to analyze video.",
        }
    }

    fn timeout_suggestion(&self) -> &'static str {
        match self.kind {
            MediaKind::Video if self.file_size_mb > LARGE_VIDEO_THRESHOLD_MB => {
                "For large videos, try using the overview analysis type for faster processing."
            }
            MediaKind::Video => "Please try again or use a shorter video.",
            MediaKind::Image => "Please try again or use a smaller image.",
        }
    }

    fn generic_suggestion(&self) -> &'static str {
        match self.kind {
            MediaKind::Video => {
                "Please try again or use the overview analysis type for faster processing."
            }
            MediaKind::Image => "Please try again.",
        }
    }
}

/// Classify a transport failure. Pure; performs no I/O.
pub fn classify(error: &TransportError, context: &ClassificationContext) -> ClassifiedError {
    let prefix = context.failure_prefix();

    if error.status() == Some(429) {
        return ClassifiedError::new(
            ErrorCategory::RateLimited,
            format!("{} {}", prefix, RATE_LIMITED_MESSAGE),
            true,
        );
    }

    if matches!(error, TransportError::Timeout { .. }) {
        return ClassifiedError::new(
            ErrorCategory::Timeout,
            format!(
                "{} Analysis is taking longer than expected ({} minutes). {}",
                prefix,
                timeout_minutes(context.timeout),
                context.timeout_suggestion()
            ),
            true,
        );
    }

    if error.status() == Some(413) {
        return ClassifiedError::new(
            ErrorCategory::PayloadTooLarge,
            format!(
                "{} File size exceeds {} limit.",
                prefix,
                format_size_compact(context.max_size_bytes)
            ),
            false,
        );
    }

    if let Some(detail) = error.detail().map(str::trim).filter(|d| !d.is_empty()) {
        let retriable = error.status().map(|s| s >= 500).unwrap_or(false);
        return ClassifiedError::new(
            ErrorCategory::ServerDetail,
            format!("{} {}", prefix, detail),
            retriable,
        );
    }

    let suggestion = match error {
        TransportError::Network(_) => NO_RESPONSE_MESSAGE,
        _ => context.generic_suggestion(),
    };
    ClassifiedError::new(
        ErrorCategory::Unknown,
        format!("{} {}", prefix, suggestion),
        true,
    )
}
