//! Shared fixtures for API integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use tempfile::TempDir;
use tokio::task::JoinHandle;

use vhs_api::{ApiConfig, AppState, UploadContext};
use vhs_media::{FrameExtractor, MediaError, MediaProbe, MediaResult};
use vhs_models::{ProbeFormat, ProbeReport, ProbeStream, StoryboardLayout, UserId};
use vhs_store::{issue_token, InMemoryRecordStore, JwtTokenResolver, LocalFileStore};
use vhs_worker::{PipelineJob, PipelineScheduler, ProcessingPipeline, SpawnScheduler};

pub const SECRET: &str = "integration_secret";
pub const OWNER: &str = "uploader-1";

pub fn token() -> String {
    issue_token(&UserId::new(OWNER), SECRET, chrono::Duration::minutes(5)).unwrap()
}

/// Probe reporting a fixed duration.
pub struct FixedProbe(pub f64);

#[async_trait]
impl MediaProbe for FixedProbe {
    async fn probe(&self, _path: &Path) -> MediaResult<ProbeReport> {
        Ok(ProbeReport {
            format: ProbeFormat {
                format_name: "mov,mp4".to_string(),
                nb_streams: 1,
                duration: Some(self.0),
                ..Default::default()
            },
            streams: vec![ProbeStream {
                codec_type: "video".to_string(),
                codec_name: "h264".to_string(),
                width: Some(640),
                height: Some(360),
                ..Default::default()
            }],
        })
    }
}

/// Writes a solid frame for every request.
pub struct SolidFrames;

#[async_trait]
impl FrameExtractor for SolidFrames {
    async fn extract_frame(
        &self,
        _source: &Path,
        _offset: f64,
        width: u32,
        height: u32,
        output: &Path,
    ) -> MediaResult<()> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        RgbImage::from_pixel(width, height, Rgb([20, 120, 220]))
            .save(output)
            .map_err(|e| MediaError::image(output, e))
    }
}

/// Records jobs without running them.
#[derive(Default)]
pub struct RecordingScheduler {
    pub jobs: Mutex<Vec<PipelineJob>>,
}

impl PipelineScheduler for RecordingScheduler {
    fn schedule(&self, job: PipelineJob) {
        self.jobs.lock().unwrap().push(job);
    }
}

/// Spawns jobs and keeps their handles so tests can wait on them.
pub struct JoiningScheduler {
    inner: SpawnScheduler,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl JoiningScheduler {
    pub async fn join_all(&self) {
        let handles: Vec<_> = self.handles.lock().unwrap().drain(..).collect();
        for handle in handles {
            handle.await.unwrap();
        }
    }
}

impl PipelineScheduler for JoiningScheduler {
    fn schedule(&self, job: PipelineJob) {
        let handle = self.inner.spawn(job);
        self.handles.lock().unwrap().push(handle);
    }
}

pub struct TestApp {
    pub root: TempDir,
    pub records: Arc<InMemoryRecordStore>,
    pub files: Arc<LocalFileStore>,
    pub ctx: UploadContext,
}

impl TestApp {
    fn base() -> (TempDir, Arc<InMemoryRecordStore>, Arc<LocalFileStore>) {
        let root = TempDir::new().unwrap();
        let records = Arc::new(InMemoryRecordStore::new(JwtTokenResolver::new(SECRET)));
        let files = Arc::new(LocalFileStore::new(root.path().join("files")));
        (root, records, files)
    }

    fn with_scheduler(
        root: TempDir,
        records: Arc<InMemoryRecordStore>,
        files: Arc<LocalFileStore>,
        scheduler: Arc<dyn PipelineScheduler>,
    ) -> Self {
        let ctx = UploadContext {
            records: records.clone(),
            files: files.clone(),
            scheduler,
            scratch_root: root.path().join("scratch"),
            default_preview: Arc::new(vhs_api::preview::render_placeholder(32, 18).unwrap()),
        };
        Self {
            root,
            records,
            files,
            ctx,
        }
    }

    /// App whose scheduler only records jobs.
    pub fn recording() -> (Self, Arc<RecordingScheduler>) {
        let (root, records, files) = Self::base();
        let scheduler = Arc::new(RecordingScheduler::default());
        let app = Self::with_scheduler(root, records, files, scheduler.clone());
        (app, scheduler)
    }

    /// App running the real pipeline over fake media tools.
    pub fn processing(duration: f64) -> (Self, Arc<JoiningScheduler>) {
        let (root, records, files) = Self::base();
        let pipeline = ProcessingPipeline::new(
            records.clone(),
            files.clone(),
            Arc::new(FixedProbe(duration)),
            Arc::new(SolidFrames),
        )
        .with_layout(StoryboardLayout {
            cell_width: 18,
            cell_height: 10,
            ..Default::default()
        })
        .with_preview_size(64, 36);

        let scheduler = Arc::new(JoiningScheduler {
            inner: SpawnScheduler::new(Arc::new(pipeline)),
            handles: Mutex::new(Vec::new()),
        });
        let app = Self::with_scheduler(root, records, files, scheduler.clone());
        (app, scheduler)
    }

    pub fn state(&self) -> AppState {
        AppState::new(ApiConfig::default(), self.ctx.clone())
    }

    pub fn scratch_root(&self) -> PathBuf {
        self.root.path().join("scratch")
    }
}
