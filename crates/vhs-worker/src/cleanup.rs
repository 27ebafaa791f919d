//! Scratch teardown with aggregated errors.

use std::fmt;
use std::io;
use std::path::Path;

use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::scratch::ScratchLayout;

/// One failed teardown action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    pub action: String,
    pub message: String,
}

impl fmt::Display for CleanupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action, self.message)
    }
}

/// Every failure of a cleanup run.
#[derive(Debug, Error)]
#[error("{} cleanup action(s) failed: {}", .failures.len(), join_failures(.failures))]
pub struct CleanupError {
    pub failures: Vec<CleanupFailure>,
}

fn join_failures(failures: &[CleanupFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Runs independent actions and keeps every failure.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    failures: Vec<CleanupFailure>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of `action`.
    pub fn collect<E: fmt::Display>(&mut self, action: &str, result: Result<(), E>) {
        if let Err(e) = result {
            self.failures.push(CleanupFailure {
                action: action.to_string(),
                message: e.to_string(),
            });
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_result(self) -> Result<(), CleanupError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(CleanupError {
                failures: self.failures,
            })
        }
    }
}

/// Removes everything a video left on scratch storage.
#[derive(Debug, Clone)]
pub struct ScratchCleanup {
    layout: ScratchLayout,
}

impl ScratchCleanup {
    pub fn new(layout: ScratchLayout) -> Self {
        Self { layout }
    }

    /// Run all teardown actions. `upload` is the still-open upload file, if any.
    ///
    /// Targets that are already gone count as removed.
    pub async fn run(&self, upload: Option<File>) -> Result<(), CleanupError> {
        let mut collector = ErrorCollector::new();

        if let Some(mut file) = upload {
            collector.collect("close upload file", file.shutdown().await);
        }
        collector.collect(
            "remove upload file",
            ignore_missing(fs::remove_file(self.layout.upload_file()).await),
        );
        for (action, dir) in [
            ("remove storyboard dir", self.layout.thumbs_dir()),
            ("remove sheets dir", self.layout.sheets_dir()),
            ("remove cue dir", self.layout.webvtt_dir()),
            ("remove preview dir", self.layout.previews_dir()),
        ] {
            collector.collect(action, remove_dir(&dir).await);
        }

        debug!(
            video_id = %self.layout.video_id(),
            failures = collector.len(),
            "Scratch cleanup finished"
        );
        collector.into_result()
    }
}

async fn remove_dir(dir: &Path) -> io::Result<()> {
    ignore_missing(fs::remove_dir_all(dir).await)
}

fn ignore_missing(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
