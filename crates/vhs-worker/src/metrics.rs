//! Pipeline metrics.

use metrics::{counter, histogram};

use crate::error::Stage;

/// Metric names as constants for consistency.
pub mod names {
    pub const PIPELINES_COMPLETED_TOTAL: &str = "vhs_pipelines_completed_total";
    pub const PIPELINES_FAILED_TOTAL: &str = "vhs_pipelines_failed_total";
    pub const PIPELINE_DURATION_SECONDS: &str = "vhs_pipeline_duration_seconds";
    pub const STORYBOARD_FRAMES_TOTAL: &str = "vhs_storyboard_frames_total";
    pub const CLEANUP_FAILURES_TOTAL: &str = "vhs_cleanup_failures_total";
}

pub fn record_pipeline_completed(duration_secs: f64, frames: usize) {
    counter!(names::PIPELINES_COMPLETED_TOTAL).increment(1);
    counter!(names::STORYBOARD_FRAMES_TOTAL).increment(frames as u64);
    histogram!(names::PIPELINE_DURATION_SECONDS).record(duration_secs);
}

pub fn record_pipeline_failed(stage: Stage) {
    let labels = [("stage", stage.as_str().to_string())];
    counter!(names::PIPELINES_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_cleanup_failures(count: usize) {
    counter!(names::CLEANUP_FAILURES_TOTAL).increment(count as u64);
}
