//! Test doubles for pipeline tests.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use tempfile::TempDir;

use vhs_media::{FrameExtractor, MediaError, MediaProbe, MediaResult};
use vhs_models::{
    FileRef, ProbeFormat, ProbeReport, ProbeStream, StoryboardLayout, UserId, VideoEntity,
    VideoId,
};
use vhs_store::{
    FileSource, FileStore, InMemoryRecordStore, JwtTokenResolver, LocalFileStore, RecordStore,
    StoreError, StoreResult,
};

use crate::pipeline::ProcessingPipeline;
use crate::scratch::ScratchLayout;

pub const DEFAULT_PREVIEW: &str = "default_preview.jpg";
pub const TEST_OWNER: &str = "owner-1";
pub const TEST_PREVIEW_SIZE: (u32, u32) = (64, 36);

/// Default grid with tiny cells so sheets encode quickly.
pub fn test_layout() -> StoryboardLayout {
    StoryboardLayout {
        cell_width: 18,
        cell_height: 10,
        ..Default::default()
    }
}

/// Probe returning a fixed duration, or failing.
pub struct FakeProbe {
    duration: Option<f64>,
}

impl FakeProbe {
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration: Some(duration),
        }
    }

    pub fn failing() -> Self {
        Self { duration: None }
    }
}

#[async_trait]
impl MediaProbe for FakeProbe {
    async fn probe(&self, path: &Path) -> MediaResult<ProbeReport> {
        let duration = self
            .duration
            .ok_or_else(|| MediaError::InvalidVideo(format!("{} is not a video", path.display())))?;
        Ok(ProbeReport {
            format: ProbeFormat {
                format_name: "mov,mp4".to_string(),
                nb_streams: 1,
                duration: Some(duration),
                ..Default::default()
            },
            streams: vec![ProbeStream {
                index: 0,
                codec_type: "video".to_string(),
                codec_name: "h264".to_string(),
                width: Some(1920),
                height: Some(1080),
                duration: Some(duration),
                ..Default::default()
            }],
        })
    }
}

/// Writes solid-color JPEGs and records each request.
#[derive(Clone, Default)]
pub struct FakeFrames {
    pub(crate) calls: Arc<Mutex<Vec<(f64, u32)>>>,
    pub fail_at_offset: Option<f64>,
    /// Write bytes that do not decode as an image.
    pub garbage: bool,
}

impl FakeFrames {
    pub fn offsets(&self) -> Vec<f64> {
        self.calls.lock().unwrap().iter().map(|c| c.0).collect()
    }

    pub fn widths(&self) -> Vec<u32> {
        self.calls.lock().unwrap().iter().map(|c| c.1).collect()
    }
}

#[async_trait]
impl FrameExtractor for FakeFrames {
    async fn extract_frame(
        &self,
        _source: &Path,
        offset: f64,
        width: u32,
        height: u32,
        output: &Path,
    ) -> MediaResult<()> {
        self.calls.lock().unwrap().push((offset, width));
        if self.fail_at_offset == Some(offset) {
            return Err(MediaError::FileNotFound(output.to_path_buf()));
        }
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if self.garbage {
            std::fs::write(output, b"garbage")?;
        } else {
            RgbImage::from_pixel(width, height, Rgb([200, 30, 30]))
                .save(output)
                .map_err(|e| MediaError::image(output, e))?;
        }
        Ok(())
    }
}

/// File store that rejects names with a given suffix.
pub struct FlakyFiles {
    inner: LocalFileStore,
    fail_suffix: &'static str,
}

#[async_trait]
impl FileStore for FlakyFiles {
    async fn persist(
        &self,
        video_id: &VideoId,
        source: FileSource,
        name: &str,
    ) -> StoreResult<FileRef> {
        if name.ends_with(self.fail_suffix) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.persist(video_id, source, name).await
    }

    async fn read(&self, video_id: &VideoId, file: &FileRef) -> StoreResult<Vec<u8>> {
        self.inner.read(video_id, file).await
    }

    async fn remove(&self, video_id: &VideoId, file: &FileRef) -> StoreResult<()> {
        self.inner.remove(video_id, file).await
    }

    fn public_url(&self, video_id: &VideoId, file: &FileRef) -> String {
        self.inner.public_url(video_id, file)
    }
}

/// A placeholder record with an uploaded scratch file.
pub struct TestEnv {
    pub root: TempDir,
    pub records: Arc<InMemoryRecordStore>,
    pub files: Arc<dyn FileStore>,
    pub video_id: VideoId,
    pub scratch: ScratchLayout,
}

impl TestEnv {
    pub async fn new() -> Self {
        let root = TempDir::new().unwrap();
        let records = Arc::new(InMemoryRecordStore::new(JwtTokenResolver::new("secret")));

        let mut video = VideoEntity::placeholder(UserId::new(TEST_OWNER), "clip.mp4");
        video.preview = Some(FileRef::new(DEFAULT_PREVIEW));
        let video = records.create(video).await.unwrap();

        let scratch = ScratchLayout::new(root.path().join("scratch"), video.id.clone());
        std::fs::create_dir_all(scratch.upload_file().parent().unwrap()).unwrap();
        std::fs::write(scratch.upload_file(), b"fake video bytes").unwrap();

        let files = Arc::new(LocalFileStore::new(root.path().join("files")));

        Self {
            root,
            records,
            files,
            video_id: video.id,
            scratch,
        }
    }

    pub fn failing_files(mut self, fail_suffix: &'static str) -> Self {
        self.files = Arc::new(FlakyFiles {
            inner: LocalFileStore::new(self.root.path().join("files")),
            fail_suffix,
        });
        self
    }

    pub fn pipeline(&self, probe: FakeProbe, frames: FakeFrames) -> ProcessingPipeline {
        ProcessingPipeline::new(
            self.records.clone(),
            self.files.clone(),
            Arc::new(probe),
            Arc::new(frames),
        )
        .with_layout(test_layout())
        .with_preview_size(TEST_PREVIEW_SIZE.0, TEST_PREVIEW_SIZE.1)
    }

    pub async fn video(&self) -> VideoEntity {
        self.records.find_by_id(&self.video_id).await.unwrap()
    }

    pub async fn read(&self, file: &FileRef) -> Vec<u8> {
        self.files.read(&self.video_id, file).await.unwrap()
    }

    pub fn assert_scratch_clean(&self) {
        assert!(!self.scratch.upload_file().exists(), "upload file left behind");
        assert!(!self.scratch.thumbs_dir().exists(), "storyboard left behind");
        assert!(!self.scratch.sheets_dir().exists(), "sheets left behind");
        assert!(!self.scratch.webvtt_dir().exists(), "cue file left behind");
        assert!(!self.scratch.previews_dir().exists(), "preview left behind");
    }
}
