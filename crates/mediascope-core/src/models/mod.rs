pub mod analysis;
pub mod media;
pub mod submission;

pub use analysis::{AnalysisMode, AnalysisResult, ImageResult, VideoResult, VideoSection};
pub use media::{
    FileSource, MediaConstraint, MediaConstraints, MediaFile, MediaKind, IMAGE_MAX_SIZE_BYTES,
    VIDEO_MAX_SIZE_BYTES,
};
pub use submission::{SubmissionState, UploadRequest};
