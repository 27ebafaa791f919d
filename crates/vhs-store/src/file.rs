//! File store collaborator.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use vhs_models::{FileRef, VideoId};

use crate::error::{StoreError, StoreResult};

/// Default prefix of public file URLs.
pub const DEFAULT_PUBLIC_BASE: &str = "/api/files/videos";

/// Content to persist.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Copy an existing file; the source is left in place.
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// Permanent storage for the assets of a video record.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store `source` under the video, returning the stored file reference.
    async fn persist(
        &self,
        video_id: &VideoId,
        source: FileSource,
        name: &str,
    ) -> StoreResult<FileRef>;

    /// Read a stored file.
    async fn read(&self, video_id: &VideoId, file: &FileRef) -> StoreResult<Vec<u8>>;

    /// Delete a stored file. A missing file is not an error.
    async fn remove(&self, video_id: &VideoId, file: &FileRef) -> StoreResult<()>;

    /// Externally resolvable URL of a stored file.
    fn public_url(&self, video_id: &VideoId, file: &FileRef) -> String;
}

/// [`FileStore`] on the local filesystem.
///
/// Files live at `<root>/<video id>/<stored name>`.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
    public_base: String,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_public_base(root, DEFAULT_PUBLIC_BASE)
    }

    pub fn with_public_base(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn video_dir(&self, video_id: &VideoId) -> StoreResult<PathBuf> {
        check_segment(video_id.as_str())?;
        Ok(self.root.join(video_id.as_str()))
    }

    /// Location of a stored file.
    pub fn path_of(&self, video_id: &VideoId, file: &FileRef) -> StoreResult<PathBuf> {
        check_segment(file.as_str())?;
        Ok(self.video_dir(video_id)?.join(file.as_str()))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn persist(
        &self,
        video_id: &VideoId,
        source: FileSource,
        name: &str,
    ) -> StoreResult<FileRef> {
        let dir = self.video_dir(video_id)?;
        fs::create_dir_all(&dir).await?;

        let file = FileRef::new(stored_name(name)?);
        let target = dir.join(file.as_str());

        match source {
            FileSource::Path(path) => {
                debug!("Copying {} to {}", path.display(), target.display());
                fs::copy(&path, &target).await.map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => {
                        StoreError::not_found(path.display().to_string())
                    }
                    _ => StoreError::Io(e),
                })?;
            }
            FileSource::Bytes(data) => {
                debug!("Writing {} bytes to {}", data.len(), target.display());
                fs::write(&target, data).await?;
            }
        }

        info!(video_id = %video_id, file = %file, "Persisted file");
        Ok(file)
    }

    async fn read(&self, video_id: &VideoId, file: &FileRef) -> StoreResult<Vec<u8>> {
        let path = self.path_of(video_id, file)?;
        fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::not_found(format!("{}/{}", video_id, file)),
            _ => StoreError::Io(e),
        })
    }

    async fn remove(&self, video_id: &VideoId, file: &FileRef) -> StoreResult<()> {
        let path = self.path_of(video_id, file)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(video_id = %video_id, file = %file, "Removed file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn public_url(&self, video_id: &VideoId, file: &FileRef) -> String {
        format!("{}/{}/{}", self.public_base, video_id, file)
    }
}

/// Reject anything that is not a single path segment.
fn check_segment(segment: &str) -> StoreResult<()> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
    {
        return Err(StoreError::InvalidName(segment.to_string()));
    }
    Ok(())
}

/// Sanitized, collision-free name: `<stem>_<random>.<ext>`.
fn stored_name(name: &str) -> StoreResult<String> {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StoreError::InvalidName(name.to_string()))?;

    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (base, None),
    };

    let clean = |s: &str| -> String {
        s.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect()
    };

    let suffix = &Uuid::new_v4().simple().to_string()[..10];
    let stem = clean(stem);
    let stem = if stem.is_empty() { "file".to_string() } else { stem };

    Ok(match ext.map(clean).filter(|e| !e.is_empty()) {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext),
        None => format!("{}_{}", stem, suffix),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stored_name() {
        let name = stored_name("My Clip.MP4").unwrap();
        assert!(name.starts_with("my_clip_"), "{}", name);
        assert!(name.ends_with(".mp4"));
        assert_ne!(stored_name("a.jpg").unwrap(), stored_name("a.jpg").unwrap());

        let bare = stored_name("thumbs").unwrap();
        assert!(bare.starts_with("thumbs_") && !bare.contains('.'));
        assert!(stored_name("../../etc/passwd").unwrap().starts_with("passwd_"));
    }

    #[tokio::test]
    async fn test_persist_bytes_and_read() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path());
        let id = VideoId::from_string("v1");

        let file = store
            .persist(&id, FileSource::Bytes(b"WEBVTT\n\n".to_vec()), "thumbs.vtt")
            .await
            .unwrap();
        assert!(file.as_str().ends_with(".vtt"));
        assert_eq!(store.read(&id, &file).await.unwrap(), b"WEBVTT\n\n");
    }

    #[tokio::test]
    async fn test_persist_path_copies() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("upload.part");
        std::fs::write(&source, b"video").unwrap();

        let store = LocalFileStore::new(dir.path().join("files"));
        let id = VideoId::from_string("v2");
        let file = store
            .persist(&id, FileSource::Path(source.clone()), "clip.mp4")
            .await
            .unwrap();

        assert!(source.exists());
        assert!(store.path_of(&id, &file).unwrap().exists());
    }

    #[tokio::test]
    async fn test_missing_source() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path());
        let err = store
            .persist(
                &VideoId::from_string("v3"),
                FileSource::Path(dir.path().join("gone")),
                "clip.mp4",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_read_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path());
        let err = store
            .read(&VideoId::from_string("v1"), &FileRef::new("../secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidName(_)));
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path());
        let id = VideoId::from_string("v4");
        let file = store
            .persist(&id, FileSource::Bytes(vec![1, 2, 3]), "preview.jpg")
            .await
            .unwrap();

        store.remove(&id, &file).await.unwrap();
        assert!(!store.path_of(&id, &file).unwrap().exists());
        // Already gone
        store.remove(&id, &file).await.unwrap();
        assert!(matches!(
            store.remove(&id, &FileRef::new("..")).await,
            Err(StoreError::InvalidName(_))
        ));
    }

    #[test]
    fn test_public_url() {
        let store = LocalFileStore::new("/tmp/x");
        let url = store.public_url(&VideoId::from_string("v1"), &FileRef::new("sheet_abc.jpg"));
        assert_eq!(url, "/api/files/videos/v1/sheet_abc.jpg");

        let cdn = LocalFileStore::with_public_base("/tmp/x", "https://cdn.example.com/files/");
        assert_eq!(
            cdn.public_url(&VideoId::from_string("v1"), &FileRef::new("a.jpg")),
            "https://cdn.example.com/files/v1/a.jpg"
        );
    }
}
