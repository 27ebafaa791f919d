//! Per-video scratch layout.
//!
//! ```text
//! <root>/uploads/<id>.part
//! <root>/thumbs/<id>/img000000.jpg ...
//! <root>/sheets/<id>/sheet000000.jpg ...
//! <root>/webvtt/<id>/thumbs.vtt
//! <root>/previews/<id>/preview.jpg
//! ```

use std::path::{Path, PathBuf};

use vhs_models::VideoId;

pub const UPLOADS_DIR: &str = "uploads";
pub const THUMBS_DIR: &str = "thumbs";
pub const SHEETS_DIR: &str = "sheets";
pub const WEBVTT_DIR: &str = "webvtt";
pub const PREVIEWS_DIR: &str = "previews";

/// Scratch paths owned by one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchLayout {
    root: PathBuf,
    video_id: VideoId,
}

impl ScratchLayout {
    pub fn new(root: impl Into<PathBuf>, video_id: VideoId) -> Self {
        Self {
            root: root.into(),
            video_id,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    /// Partial upload being streamed by the client.
    pub fn upload_file(&self) -> PathBuf {
        self.root
            .join(UPLOADS_DIR)
            .join(format!("{}.part", self.video_id))
    }

    pub fn thumbs_dir(&self) -> PathBuf {
        self.root.join(THUMBS_DIR).join(self.video_id.as_str())
    }

    pub fn sheets_dir(&self) -> PathBuf {
        self.root.join(SHEETS_DIR).join(self.video_id.as_str())
    }

    pub fn webvtt_dir(&self) -> PathBuf {
        self.root.join(WEBVTT_DIR).join(self.video_id.as_str())
    }

    pub fn previews_dir(&self) -> PathBuf {
        self.root.join(PREVIEWS_DIR).join(self.video_id.as_str())
    }

    pub fn cue_file(&self) -> PathBuf {
        self.webvtt_dir().join("thumbs.vtt")
    }

    pub fn preview_file(&self) -> PathBuf {
        self.previews_dir().join("preview.jpg")
    }
}
