//! Detached pipeline scheduling.

use std::sync::Arc;

use tokio::task::JoinHandle;

use vhs_models::VideoId;

use crate::pipeline::ProcessingPipeline;
use crate::scratch::ScratchLayout;

/// A completed upload waiting for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineJob {
    pub video_id: VideoId,
    pub scratch: ScratchLayout,
}

impl PipelineJob {
    pub fn new(video_id: VideoId, scratch: ScratchLayout) -> Self {
        Self { video_id, scratch }
    }
}

/// Starts processing without making the caller wait for it.
pub trait PipelineScheduler: Send + Sync {
    fn schedule(&self, job: PipelineJob);
}

/// Runs each job on its own tokio task.
#[derive(Clone)]
pub struct SpawnScheduler {
    pipeline: Arc<ProcessingPipeline>,
}

impl SpawnScheduler {
    pub fn new(pipeline: Arc<ProcessingPipeline>) -> Self {
        Self { pipeline }
    }

    /// Spawn the job, returning its handle.
    pub fn spawn(&self, job: PipelineJob) -> JoinHandle<()> {
        let pipeline = Arc::clone(&self.pipeline);
        tokio::spawn(async move {
            // Outcome is logged by the pipeline itself.
            let _ = pipeline.run(&job.video_id, &job.scratch).await;
        })
    }
}

impl PipelineScheduler for SpawnScheduler {
    fn schedule(&self, job: PipelineJob) {
        drop(self.spawn(job));
    }
}
