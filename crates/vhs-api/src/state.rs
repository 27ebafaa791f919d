//! Application state.

use std::sync::Arc;

use tracing::info;

use vhs_media::{FfmpegFrameExtractor, FfprobeProbe};
use vhs_store::{InMemoryRecordStore, JwtTokenResolver, LocalFileStore, StoreConfig};
use vhs_worker::{ProcessingPipeline, SpawnScheduler, WorkerConfig};

use crate::config::ApiConfig;
use crate::preview::load_default_preview;
use crate::session::UploadContext;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub upload: UploadContext,
}

impl AppState {
    pub fn new(config: ApiConfig, upload: UploadContext) -> Self {
        Self { config, upload }
    }

    /// Build the stores, pipeline and scheduler from the environment.
    pub async fn from_env(config: ApiConfig) -> anyhow::Result<Self> {
        let store = StoreConfig::from_env()?;
        let worker = WorkerConfig::from_env();
        let layout = worker.layout();
        layout.validate()?;

        let records = Arc::new(InMemoryRecordStore::new(JwtTokenResolver::new(
            &store.jwt_secret,
        )));
        let files = Arc::new(LocalFileStore::with_public_base(
            &store.files_dir,
            &store.public_base_url,
        ));

        let (preview_width, preview_height) = worker.preview_size();
        let pipeline = ProcessingPipeline::new(
            records.clone(),
            files.clone(),
            Arc::new(FfprobeProbe::new()),
            Arc::new(FfmpegFrameExtractor::new()),
        )
        .with_layout(layout)
        .with_preview_size(preview_width, preview_height);

        let default_preview = load_default_preview(
            config.default_preview_path.as_deref(),
            preview_width,
            preview_height,
        )
        .await?;

        info!(
            files_dir = %store.files_dir.display(),
            scratch_dir = %worker.scratch_dir.display(),
            "Upload pipeline configured"
        );

        let upload = UploadContext {
            records,
            files,
            scheduler: Arc::new(SpawnScheduler::new(Arc::new(pipeline))),
            scratch_root: worker.scratch_dir,
            default_preview: Arc::new(default_preview),
        };
        Ok(Self::new(config, upload))
    }
}
