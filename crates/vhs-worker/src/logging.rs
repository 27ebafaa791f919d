//! Structured pipeline logging.

use tracing::{error, info, warn, Span};

use vhs_models::{UserId, VideoId};

use crate::error::Stage;

/// Logs pipeline lifecycle events with the video id and operation attached.
#[derive(Debug, Clone)]
pub struct PipelineLogger {
    video_id: String,
    operation: String,
    owner: Option<String>,
}

impl PipelineLogger {
    /// Create a logger for one operation on a video.
    ///
    /// # Arguments
    /// * `video_id` - The video being processed
    /// * `operation` - The kind of work (e.g., "video_processing", "upload")
    pub fn new(video_id: &VideoId, operation: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            operation: operation.to_string(),
            owner: None,
        }
    }

    /// Attach the owning user once it is known.
    pub fn set_owner(&mut self, owner: &UserId) {
        self.owner = Some(owner.to_string());
    }

    fn owner_field(&self) -> &str {
        self.owner.as_deref().unwrap_or("-")
    }

    pub fn log_start(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            operation = %self.operation,
            "Pipeline started: {}", message
        );
    }

    pub fn log_stage(&self, stage: Stage, message: &str) {
        info!(
            video_id = %self.video_id,
            operation = %self.operation,
            stage = %stage,
            "Pipeline progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            video_id = %self.video_id,
            operation = %self.operation,
            owner = %self.owner_field(),
            "Pipeline warning: {}", message
        );
    }

    /// Log a stage failure with entity context.
    pub fn log_stage_error(&self, stage: Stage, message: &str) {
        error!(
            video_id = %self.video_id,
            operation = %self.operation,
            owner = %self.owner_field(),
            stage = %stage,
            "Pipeline error: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            video_id = %self.video_id,
            operation = %self.operation,
            owner = %self.owner_field(),
            "Pipeline error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            operation = %self.operation,
            "Pipeline completed: {}", message
        );
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Span carrying the logger's fields.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "pipeline",
            video_id = %self.video_id,
            operation = %self.operation
        )
    }
}
