//! Worker error types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    Store(#[from] vhs_store::StoreError),

    #[error("Media error: {0}")]
    Media(#[from] vhs_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn invalid_media(msg: impl Into<String>) -> Self {
        Self::InvalidMedia(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

/// Processing pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Reload,
    Probe,
    PersistVideo,
    Storyboard,
    SpriteSheets,
    CueTrack,
    DefaultPreview,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Reload,
        Stage::Probe,
        Stage::PersistVideo,
        Stage::Storyboard,
        Stage::SpriteSheets,
        Stage::CueTrack,
        Stage::DefaultPreview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Reload => "reload",
            Stage::Probe => "probe",
            Stage::PersistVideo => "persist_video",
            Stage::Storyboard => "storyboard",
            Stage::SpriteSheets => "sprite_sheets",
            Stage::CueTrack => "cue_track",
            Stage::DefaultPreview => "default_preview",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pipeline stage failed; later stages did not run.
#[derive(Debug, Error)]
#[error("Stage {stage} failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: WorkerError,
}

impl StageError {
    pub fn new(stage: Stage, source: impl Into<WorkerError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    /// Error mapper for `map_err`.
    pub fn at<E: Into<WorkerError>>(stage: Stage) -> impl FnOnce(E) -> StageError {
        move |e| StageError::new(stage, e)
    }
}
