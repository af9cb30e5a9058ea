use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

/// Largest image accepted for analysis (20 MiB).
pub const IMAGE_MAX_SIZE_BYTES: u64 = 20 * 1024 * 1024;

/// Largest video accepted for analysis (5 GiB).
pub const VIDEO_MAX_SIZE_BYTES: u64 = 5 * 1024 * 1024 * 1024;

const IMAGE_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];
const VIDEO_MIME_TYPES: [&str; 5] = [
    "video/mp4",
    "video/quicktime",
    "video/webm",
    "video/avi",
    "video/x-msvideo",
];
const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "webm", "avi"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Accepted types and size ceiling for one media kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraint {
    pub kind: MediaKind,
    /// Accepted MIME types, lowercase, in display order.
    pub accepted_mime_types: Vec<String>,
    pub accepted_extensions: Vec<String>,
    pub max_size_bytes: u64,
}

impl MediaConstraint {
    pub fn new(
        kind: MediaKind,
        accepted_mime_types: Vec<String>,
        accepted_extensions: Vec<String>,
        max_size_bytes: u64,
    ) -> Self {
        let mut mime_types: Vec<String> = Vec::with_capacity(accepted_mime_types.len());
        for mime in accepted_mime_types {
            let mime = mime.trim().to_lowercase();
            if !mime_types.contains(&mime) {
                mime_types.push(mime);
            }
        }

        Self {
            kind,
            accepted_mime_types: mime_types,
            accepted_extensions: accepted_extensions
                .into_iter()
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .collect(),
            max_size_bytes,
        }
    }

    pub fn image() -> Self {
        Self::new(
            MediaKind::Image,
            IMAGE_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
            IMAGE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            IMAGE_MAX_SIZE_BYTES,
        )
    }

    pub fn video() -> Self {
        Self::new(
            MediaKind::Video,
            VIDEO_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
            VIDEO_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            VIDEO_MAX_SIZE_BYTES,
        )
    }

    pub fn accepts_mime_type(&self, mime_type: &str) -> bool {
        let normalized = mime_type.trim().to_lowercase();
        self.accepted_mime_types.iter().any(|m| m == &normalized)
    }

    pub fn accepts_extension(&self, extension: &str) -> bool {
        let normalized = extension.to_lowercase();
        self.accepted_extensions.iter().any(|e| e == &normalized)
    }

    /// Accepted types by subtype only (`jpeg, png, gif`).
    ///
    /// Unregistered `x-` aliases such as `video/x-msvideo` are accepted but
    /// not listed.
    pub fn accepted_subtypes(&self) -> Vec<&str> {
        self.accepted_mime_types
            .iter()
            .map(|m| m.split_once('/').map(|(_, sub)| sub).unwrap_or(m.as_str()))
            .filter(|sub| !sub.starts_with("x-"))
            .collect()
    }
}

/// The constraint for each media kind, fixed at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraints {
    pub image: MediaConstraint,
    pub video: MediaConstraint,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            image: MediaConstraint::image(),
            video: MediaConstraint::video(),
        }
    }
}

impl MediaConstraints {
    pub fn for_kind(&self, kind: MediaKind) -> &MediaConstraint {
        match kind {
            MediaKind::Image => &self.image,
            MediaKind::Video => &self.video,
        }
    }

    /// Pick the media kind from a path's extension.
    pub fn detect_kind(&self, path: &Path) -> Option<MediaKind> {
        let extension = path.extension()?.to_str()?;
        if self.image.accepts_extension(extension) {
            Some(MediaKind::Image)
        } else if self.video.accepts_extension(extension) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

/// Where the bytes of a [`MediaFile`] come from.
#[derive(Debug, Clone)]
pub enum FileSource {
    Path(PathBuf),
    Memory(Bytes),
}

/// A user-selected file: name, size and MIME type plus its content source.
#[derive(Debug, Clone)]
pub struct MediaFile {
    name: String,
    size: u64,
    mime_type: String,
    source: FileSource,
}

impl MediaFile {
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            mime_type: mime_type.into(),
            source: FileSource::Memory(data),
        }
    }

    /// Describe a file on disk. The MIME type is guessed from the extension
    /// and falls back to `application/octet-stream`.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Not a regular file: {}", path.display()),
            ));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let mime_type = match mime_guess::from_path(path).first_raw() {
            Some(mime) => mime.to_string(),
            None => {
                tracing::debug!(
                    path = %path.display(),
                    "Unknown extension, using application/octet-stream"
                );
                "application/octet-stream".to_string()
            }
        };

        Ok(Self {
            name,
            size: metadata.len(),
            mime_type,
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn size_mb(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }
}
