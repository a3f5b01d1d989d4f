//! Media object storage.
//!
//! # Responsibility
//! - Define the [`BlobStore`] contract used for post media, stories and
//!   avatars.
//! - Provide the filesystem implementation [`FsBlobStore`].
//!
//! # Invariants
//! - Object paths are relative, `/`-separated and never escape their bucket.
//! - An existing object is replaced only when `upsert` is requested.

mod fs_store;

pub use fs_store::FsBlobStore;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default bucket for all user media.
pub const MEDIA_BUCKET: &str = "social-media";

pub type BlobResult<T> = Result<T, BlobError>;

#[derive(Debug)]
pub enum BlobError {
    /// Path is empty, absolute or contains `..`/`.` segments.
    InvalidPath(String),
    AlreadyExists { bucket: String, path: String },
    NotFound { bucket: String, path: String },
    Io(std::io::Error),
}

impl Display for BlobError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath(path) => write!(f, "invalid object path `{path}`"),
            Self::AlreadyExists { bucket, path } => {
                write!(f, "object `{bucket}/{path}` already exists")
            }
            Self::NotFound { bucket, path } => write!(f, "object `{bucket}/{path}` not found"),
            Self::Io(err) => write!(f, "object storage io error: {err}"),
        }
    }
}

impl Error for BlobError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BlobError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Bucket/path object storage with public URLs.
pub trait BlobStore {
    /// Stores `bytes` at `bucket/path`; returns the stored path.
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
        upsert: bool,
    ) -> BlobResult<String>;
    fn download(&self, bucket: &str, path: &str) -> BlobResult<Vec<u8>>;
    /// Returns whether an object was removed.
    fn remove(&self, bucket: &str, path: &str) -> BlobResult<bool>;
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    pub file_name: String,
    /// MIME type, e.g. `image/png`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MediaUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Lowercased file extension, falling back to the MIME subtype, then `bin`.
    pub fn extension(&self) -> String {
        let from_name = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));
        let from_mime = self
            .content_type
            .split_once('/')
            .map(|(_, sub)| sub.split(';').next().unwrap_or(sub).trim())
            .filter(|sub| !sub.is_empty() && sub.chars().all(|c| c.is_ascii_alphanumeric()));
        from_name
            .or(from_mime)
            .unwrap_or("bin")
            .to_ascii_lowercase()
    }

    pub fn is_image(&self) -> bool {
        self.content_type.trim().to_ascii_lowercase().starts_with("image/")
    }

    pub fn is_video(&self) -> bool {
        self.content_type.trim().to_ascii_lowercase().starts_with("video/")
    }

    /// Object path for post or story media: `<user_id>/<now_ms>.<ext>`.
    pub fn timestamped_path(&self, user_id: uuid::Uuid, now_ms: i64) -> String {
        format!("{user_id}/{now_ms}.{}", self.extension())
    }

    /// Object path for an avatar: `<user_id>/avatar.<ext>`.
    pub fn avatar_path(&self, user_id: uuid::Uuid) -> String {
        format!("{user_id}/avatar.{}", self.extension())
    }
}

/// Splits an object path into validated segments.
pub(crate) fn object_segments(path: &str) -> BlobResult<Vec<&str>> {
    let trimmed = path.trim();
    if trimmed.is_empty() || trimmed.starts_with('/') || trimmed.contains('\\') {
        return Err(BlobError::InvalidPath(path.to_string()));
    }
    let segments: Vec<&str> = trimmed.split('/').collect();
    if segments
        .iter()
        .any(|segment| segment.is_empty() || *segment == "." || *segment == "..")
    {
        return Err(BlobError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::{object_segments, BlobError, MediaUpload};
    use uuid::Uuid;

    #[test]
    fn extension_prefers_file_name_then_mime() {
        let upload = MediaUpload::new("Holiday.JPG", "image/jpeg", vec![1]);
        assert_eq!(upload.extension(), "jpg");
        let upload = MediaUpload::new("clip", "video/mp4", vec![1]);
        assert_eq!(upload.extension(), "mp4");
        let upload = MediaUpload::new("blob", "application/", vec![1]);
        assert_eq!(upload.extension(), "bin");
    }

    #[test]
    fn object_paths_follow_layout() {
        let user = Uuid::new_v4();
        let upload = MediaUpload::new("me.png", "image/png", vec![1]);
        assert_eq!(upload.avatar_path(user), format!("{user}/avatar.png"));
        assert_eq!(
            upload.timestamped_path(user, 1_700_000_000_000),
            format!("{user}/1700000000000.png")
        );
        assert!(upload.is_image());
        assert!(!upload.is_video());
    }

    #[test]
    fn object_segments_reject_escapes() {
        assert_eq!(object_segments("a/b.png").unwrap(), vec!["a", "b.png"]);
        for bad in ["", "/abs", "a/../b", "a//b", "./a", "a\\b"] {
            assert!(matches!(object_segments(bad), Err(BlobError::InvalidPath(_))));
        }
    }
}
