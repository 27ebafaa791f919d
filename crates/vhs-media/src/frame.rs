//! Single-frame extraction.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Timeout for extracting one frame.
pub const FRAME_EXTRACT_TIMEOUT_SECS: u64 = 60;

/// Writes the frame at a given offset of a video as an image file.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Extract the frame at `offset` seconds, scaled to `width` x `height`.
    ///
    /// Implementations must fail if no image was written to `output`.
    async fn extract_frame(
        &self,
        source: &Path,
        offset: f64,
        width: u32,
        height: u32,
        output: &Path,
    ) -> MediaResult<()>;
}

/// [`FrameExtractor`] backed by the ffmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    runner: FfmpegRunner,
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegFrameExtractor {
    pub fn new() -> Self {
        Self {
            runner: FfmpegRunner::new().with_timeout(FRAME_EXTRACT_TIMEOUT_SECS),
        }
    }

    /// Build the ffmpeg invocation for one frame.
    pub fn command(
        source: &Path,
        offset: f64,
        width: u32,
        height: u32,
        output: &Path,
    ) -> FfmpegCommand {
        FfmpegCommand::new(source, output)
            .seek(offset)
            .single_frame()
            .scale(width, height)
            .log_level("error")
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract_frame(
        &self,
        source: &Path,
        offset: f64,
        width: u32,
        height: u32,
        output: &Path,
    ) -> MediaResult<()> {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).await?;
        }

        let cmd = Self::command(source, offset, width, height, output);
        self.runner.run(&cmd).await?;

        // ffmpeg exits cleanly without writing anything when seeking past the last frame.
        match fs::metadata(output).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(MediaError::FileNotFound(output.to_path_buf())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_command() {
        let cmd = FfmpegFrameExtractor::command(
            Path::new("in.mp4"),
            6.0,
            1280,
            720,
            Path::new("out/preview.jpg"),
        );
        let args = cmd.build_args();
        assert!(args.contains(&"6.000".to_string()));
        assert!(args.contains(&"scale=1280:720".to_string()));
        assert_eq!(cmd.output(), Path::new("out/preview.jpg"));
    }
}
