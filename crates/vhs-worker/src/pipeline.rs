//! Post-upload processing pipeline.
//!
//! Stages run in a fixed order and each one saves its result on the record
//! before the next starts, so a failure leaves every earlier result in place.
//! Scratch files are removed when the run ends, whatever the outcome.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::Instrument;

use vhs_media::{
    build_cues, build_sprite_sheets, extract_storyboard, write_cue_file, FrameExtractor,
    MediaProbe,
};
use vhs_models::{StoryboardLayout, VideoEntity, VideoId, VIDEO_INFO_VERSION};
use vhs_store::{FileSource, FileStore, RecordStore};

use crate::cleanup::ScratchCleanup;
use crate::error::{Stage, StageError, WorkerError};
use crate::logging::PipelineLogger;
use crate::metrics;
use crate::scratch::ScratchLayout;

/// Name under which the generated preview is stored.
pub const PREVIEW_FILE_NAME: &str = "preview.jpg";

/// Name under which the cue track is stored.
pub const CUE_FILE_NAME: &str = "thumbs.vtt";

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub video_id: VideoId,
    pub duration: f64,
    pub frames: usize,
    pub sheets: usize,
    pub cues: usize,
    pub preview_generated: bool,
}

/// Processes an uploaded video into its published assets.
pub struct ProcessingPipeline {
    records: Arc<dyn RecordStore>,
    files: Arc<dyn FileStore>,
    probe: Arc<dyn MediaProbe>,
    frames: Arc<dyn FrameExtractor>,
    layout: StoryboardLayout,
    preview_size: (u32, u32),
}

impl ProcessingPipeline {
    pub fn new(
        records: Arc<dyn RecordStore>,
        files: Arc<dyn FileStore>,
        probe: Arc<dyn MediaProbe>,
        frames: Arc<dyn FrameExtractor>,
    ) -> Self {
        Self {
            records,
            files,
            probe,
            frames,
            layout: StoryboardLayout::default(),
            preview_size: (
                vhs_models::storyboard::DEFAULT_PREVIEW_WIDTH,
                vhs_models::storyboard::DEFAULT_PREVIEW_HEIGHT,
            ),
        }
    }

    pub fn with_layout(mut self, layout: StoryboardLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_preview_size(mut self, width: u32, height: u32) -> Self {
        self.preview_size = (width, height);
        self
    }

    pub fn layout(&self) -> &StoryboardLayout {
        &self.layout
    }

    /// Run every stage for `video_id`, then clean up its scratch files.
    pub async fn run(
        &self,
        video_id: &VideoId,
        scratch: &ScratchLayout,
    ) -> Result<PipelineReport, StageError> {
        let mut logger = PipelineLogger::new(video_id, "video_processing");
        let span = logger.create_span();

        async move {
            let started = Instant::now();
            logger.log_start(&format!("processing {}", scratch.upload_file().display()));

            let result = self.run_stages(video_id, scratch, &mut logger).await;

            match &result {
                Ok(report) => {
                    logger.log_completion(&format!(
                        "{} frames, {} sheets, {} cues, preview generated: {}",
                        report.frames, report.sheets, report.cues, report.preview_generated
                    ));
                    metrics::record_pipeline_completed(
                        started.elapsed().as_secs_f64(),
                        report.frames,
                    );
                }
                Err(e) => {
                    logger.log_stage_error(e.stage, &e.source.to_string());
                    metrics::record_pipeline_failed(e.stage);
                }
            }

            if let Err(cleanup) = ScratchCleanup::new(scratch.clone()).run(None).await {
                logger.log_error(&format!("error while clearing video files: {}", cleanup));
                metrics::record_cleanup_failures(cleanup.failures.len());
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        video_id: &VideoId,
        scratch: &ScratchLayout,
        logger: &mut PipelineLogger,
    ) -> Result<PipelineReport, StageError> {
        let upload = scratch.upload_file();

        // 1. Reload
        let mut video = self
            .records
            .find_by_id(video_id)
            .await
            .map_err(StageError::at(Stage::Reload))?;
        logger.set_owner(&video.owner);

        // 2. Probe
        let report = self
            .probe
            .probe(&upload)
            .await
            .map_err(StageError::at(Stage::Probe))?;
        let duration = report
            .duration()
            .ok_or_else(|| StageError::new(Stage::Probe, WorkerError::invalid_media("no duration")))?;
        video.duration = Some(duration);
        video.info.version = VIDEO_INFO_VERSION;
        video.info.meta = Some(report);
        self.save(&mut video, Stage::Probe).await?;
        logger.log_stage(Stage::Probe, &format!("duration {:.3}s", duration));

        // 3. Attach the upload as the video asset
        let file = self
            .files
            .persist(video_id, FileSource::Path(upload.clone()), &video.name)
            .await
            .map_err(StageError::at(Stage::PersistVideo))?;
        video.video_file = Some(file);
        self.save(&mut video, Stage::PersistVideo).await?;

        // 4. Storyboard
        let frames = extract_storyboard(
            self.frames.as_ref(),
            &upload,
            duration,
            &self.layout,
            &scratch.thumbs_dir(),
        )
        .await
        .map_err(StageError::at(Stage::Storyboard))?;
        logger.log_stage(Stage::Storyboard, &format!("{} frames", frames.len()));

        let mut sheets = 0;
        let mut cues = 0;
        if frames.is_empty() {
            logger.log_warning("video too short for a storyboard, skipping sheets and cues");
        } else {
            // 5. Sprite sheets
            let paths = build_sprite_sheets(&frames, &self.layout, &scratch.sheets_dir())
                .await
                .map_err(StageError::at(Stage::SpriteSheets))?;
            let mut thumbnails = Vec::with_capacity(paths.len());
            for path in paths {
                let name = file_name(&path);
                let file = self
                    .files
                    .persist(video_id, FileSource::Path(path), &name)
                    .await
                    .map_err(StageError::at(Stage::SpriteSheets))?;
                thumbnails.push(file);
            }
            sheets = thumbnails.len();
            video.thumbnails = thumbnails;
            self.save(&mut video, Stage::SpriteSheets).await?;
            logger.log_stage(Stage::SpriteSheets, &format!("{} sheets", sheets));

            // 6. Cue track
            let sheet_urls: Vec<String> = video
                .thumbnails
                .iter()
                .map(|file| self.files.public_url(video_id, file))
                .collect();
            let entries = build_cues(frames.len(), duration, &self.layout, &sheet_urls)
                .map_err(StageError::at(Stage::CueTrack))?;
            let cue_path = scratch.cue_file();
            write_cue_file(&entries, &cue_path)
                .await
                .map_err(StageError::at(Stage::CueTrack))?;
            let file = self
                .files
                .persist(video_id, FileSource::Path(cue_path), CUE_FILE_NAME)
                .await
                .map_err(StageError::at(Stage::CueTrack))?;
            cues = entries.len();
            video.cue_file = Some(file);
            self.save(&mut video, Stage::CueTrack).await?;
        }

        // 7. Default preview, unless the uploader picked one
        let preview_generated = !video.preview_set;
        if preview_generated {
            let (width, height) = self.preview_size;
            let preview_path = scratch.preview_file();
            self.frames
                .extract_frame(&upload, duration / 2.0, width, height, &preview_path)
                .await
                .map_err(StageError::at(Stage::DefaultPreview))?;
            let file = self
                .files
                .persist(video_id, FileSource::Path(preview_path), PREVIEW_FILE_NAME)
                .await
                .map_err(StageError::at(Stage::DefaultPreview))?;
            video.preview = Some(file);
            self.save(&mut video, Stage::DefaultPreview).await?;
        }

        Ok(PipelineReport {
            video_id: video_id.clone(),
            duration,
            frames: frames.len(),
            sheets,
            cues,
            preview_generated,
        })
    }

    async fn save(&self, video: &mut VideoEntity, stage: Stage) -> Result<(), StageError> {
        video.touch();
        self.records
            .save(video)
            .await
            .map_err(StageError::at(stage))
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
