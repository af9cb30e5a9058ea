//! Locally held resources tied to a submission.
//!
//! A UI typically shows the selected file while it uploads. [`PreviewFile`]
//! stages a temporary copy for that purpose; the orchestrator releases every
//! held resource when the submission is cancelled, reset or dropped.

use mediascope_core::{FileSource, MediaFile};
use std::path::Path;
use tempfile::TempPath;

/// Client-side handle released synchronously on cancellation.
pub trait LocalResource: Send {
    fn release(&mut self);
}

/// Temporary on-disk copy of a media file.
#[derive(Debug)]
pub struct PreviewFile {
    path: Option<TempPath>,
}

impl PreviewFile {
    pub async fn stage(file: &MediaFile) -> std::io::Result<Self> {
        let extension = Path::new(file.name())
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        let staged = tempfile::Builder::new()
            .prefix("mediascope-preview-")
            .suffix(&extension)
            .tempfile()?
            .into_temp_path();

        match file.source() {
            FileSource::Path(source) => {
                tokio::fs::copy(source, &staged).await?;
            }
            FileSource::Memory(data) => {
                tokio::fs::write(&staged, data).await?;
            }
        }

        tracing::debug!(path = %staged.display(), file = %file.name(), "Staged preview");
        Ok(Self { path: Some(staged) })
    }

    /// Location of the preview, or `None` once released.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_released(&self) -> bool {
        self.path.is_none()
    }
}

impl LocalResource for PreviewFile {
    fn release(&mut self) {
        if let Some(path) = self.path.take() {
            let location = path.display().to_string();
            if let Err(e) = path.close() {
                tracing::warn!(path = %location, error = %e, "Failed to remove preview");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stage_and_release_memory_file() {
        let file = MediaFile::from_bytes("cat.png", "image/png", b"not really a png".to_vec());
        let mut preview = PreviewFile::stage(&file).await.unwrap();

        let path = preview.path().unwrap().to_path_buf();
        assert!(path.to_string_lossy().ends_with(".png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"not really a png");

        preview.release();
        assert!(preview.is_released());
        assert!(!path.exists());

        // Releasing twice is a no-op.
        preview.release();
    }

    #[tokio::test]
    async fn test_release_after_external_removal() {
        let file = MediaFile::from_bytes("clip.mp4", "video/mp4", b"frames".to_vec());
        let mut preview = PreviewFile::stage(&file).await.unwrap();
        std::fs::remove_file(preview.path().unwrap()).unwrap();

        // Removal failure is logged, not raised.
        preview.release();
        assert!(preview.is_released());
        assert!(preview.path().is_none());
    }

    #[tokio::test]
    async fn test_stage_path_file() {
        let source = tempfile::Builder::new().suffix(".gif").tempfile().unwrap();
        std::fs::write(source.path(), b"GIF89a").unwrap();
        let file = MediaFile::from_path(source.path()).await.unwrap();

        let mut preview = PreviewFile::stage(&file).await.unwrap();
        let path = preview.path().unwrap().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"GIF89a");
        preview.release();
        assert!(!path.exists());
    }
}
