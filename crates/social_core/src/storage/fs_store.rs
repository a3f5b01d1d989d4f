//! Filesystem-backed [`BlobStore`].

use super::{object_segments, BlobError, BlobResult, BlobStore};
use log::{info, warn};
use std::fs;
use std::io::ErrorKind;
use std::io::Write;
use std::path::PathBuf;

/// Stores objects under `<root>/<bucket>/<path>`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    /// `public_base_url` is joined as `<base>/<bucket>/<path>`; a trailing
    /// `/` is ignored.
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            public_base_url,
        }
    }

    fn object_file(&self, bucket: &str, path: &str) -> BlobResult<PathBuf> {
        let bucket_segments = object_segments(bucket)?;
        if bucket_segments.len() != 1 {
            return Err(BlobError::InvalidPath(bucket.to_string()));
        }
        let mut file = self.root.join(bucket_segments[0]);
        for segment in object_segments(path)? {
            file.push(segment);
        }
        Ok(file)
    }
}

impl BlobStore for FsBlobStore {
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
        upsert: bool,
    ) -> BlobResult<String> {
        let file = self.object_file(bucket, path)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true);
        if upsert {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let mut handle = options.open(&file).map_err(|err| {
            if err.kind() == ErrorKind::AlreadyExists {
                BlobError::AlreadyExists {
                    bucket: bucket.to_string(),
                    path: path.to_string(),
                }
            } else {
                BlobError::Io(err)
            }
        })?;
        handle.write_all(bytes)?;
        handle.flush()?;

        info!(
            "event=blob_upload module=storage status=ok bucket={} bytes={} content_type={} upsert={}",
            bucket,
            bytes.len(),
            content_type,
            upsert
        );
        Ok(path.trim().to_string())
    }

    fn download(&self, bucket: &str, path: &str) -> BlobResult<Vec<u8>> {
        let file = self.object_file(bucket, path)?;
        fs::read(&file).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                BlobError::NotFound {
                    bucket: bucket.to_string(),
                    path: path.to_string(),
                }
            } else {
                BlobError::Io(err)
            }
        })
    }

    fn remove(&self, bucket: &str, path: &str) -> BlobResult<bool> {
        let file = self.object_file(bucket, path)?;
        match fs::remove_file(&file) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!("event=blob_remove module=storage status=missing bucket={bucket}");
                Ok(false)
            }
            Err(err) => Err(BlobError::Io(err)),
        }
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_base_url,
            bucket,
            path.trim().trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::FsBlobStore;
    use crate::storage::{BlobError, BlobStore};

    #[test]
    fn upload_refuses_overwrite_without_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "http://localhost/media/");

        store.upload("bucket", "u/a.png", b"one", "image/png", false).unwrap();
        let second = store.upload("bucket", "u/a.png", b"two", "image/png", false);
        assert!(matches!(second, Err(BlobError::AlreadyExists { .. })));

        store.upload("bucket", "u/a.png", b"two", "image/png", true).unwrap();
        assert_eq!(store.download("bucket", "u/a.png").unwrap(), b"two".to_vec());
        assert_eq!(
            store.public_url("bucket", "u/a.png"),
            "http://localhost/media/bucket/u/a.png"
        );
    }

    #[test]
    fn remove_reports_missing_objects() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "http://localhost");
        store.upload("b", "x.bin", b"x", "application/octet-stream", false).unwrap();
        assert!(store.remove("b", "x.bin").unwrap());
        assert!(!store.remove("b", "x.bin").unwrap());
        assert!(matches!(
            store.download("b", "x.bin"),
            Err(BlobError::NotFound { .. })
        ));
    }

    #[test]
    fn bucket_must_be_single_segment() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "http://localhost");
        assert!(matches!(
            store.upload("a/b", "x", b"x", "text/plain", false),
            Err(BlobError::InvalidPath(_))
        ));
    }
}
