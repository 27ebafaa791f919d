//! Post-upload video processing.
//!
//! This crate provides:
//! - The staged processing pipeline (probe, persist, storyboard, sheets, cues, preview)
//! - Scratch layout and cleanup with aggregated errors
//! - Detached scheduling on tokio tasks
//! - Structured pipeline logging

pub mod cleanup;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod scheduler;
pub mod scratch;

#[cfg(test)]
pub(crate) mod testing;

pub use cleanup::{CleanupError, CleanupFailure, ErrorCollector, ScratchCleanup};
pub use config::WorkerConfig;
pub use error::{Stage, StageError, WorkerError, WorkerResult};
pub use logging::PipelineLogger;
pub use pipeline::{PipelineReport, ProcessingPipeline};
pub use scheduler::{PipelineJob, PipelineScheduler, SpawnScheduler};
pub use scratch::ScratchLayout;
