use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::analysis::AnalysisMode;
use super::media::{MediaFile, MediaKind};

/// Lifecycle of one submission.
///
/// `Idle -> Validating -> (Failed | Uploading -> (Succeeded | Failed))`.
/// `Succeeded` and `Failed` are terminal until the caller resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    Uploading,
    Succeeded,
    Failed,
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionState::Succeeded | SubmissionState::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: SubmissionState) -> bool {
        use SubmissionState::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Uploading)
                | (Validating, Failed)
                | (Uploading, Succeeded)
                | (Uploading, Failed)
        )
    }
}

impl Display for SubmissionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SubmissionState::Idle => write!(f, "idle"),
            SubmissionState::Validating => write!(f, "validating"),
            SubmissionState::Uploading => write!(f, "uploading"),
            SubmissionState::Succeeded => write!(f, "succeeded"),
            SubmissionState::Failed => write!(f, "failed"),
        }
    }
}

/// Everything the transport needs to send one file.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: MediaFile,
    pub kind: MediaKind,
    /// Only sent for videos.
    pub analysis_mode: Option<AnalysisMode>,
}

impl UploadRequest {
    pub fn image(file: MediaFile) -> Self {
        Self {
            file,
            kind: MediaKind::Image,
            analysis_mode: None,
        }
    }

    pub fn video(file: MediaFile, analysis_mode: AnalysisMode) -> Self {
        Self {
            file,
            kind: MediaKind::Video,
            analysis_mode: Some(analysis_mode),
        }
    }
}
