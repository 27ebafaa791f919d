//! Storyboard extraction.
//!
//! Samples one frame every `layout.interval` seconds, starting one second
//! in, and writes them as `img000000.jpg`, `img000001.jpg`, ... at the cell
//! resolution. Every sampled offset must yield an image; a storyboard with
//! holes is never returned.

use std::path::Path;

use tokio::fs;
use tracing::debug;

use vhs_models::{StoryboardFrame, StoryboardLayout};

use crate::error::MediaResult;
use crate::frame::FrameExtractor;

/// File name of the frame with sequence number `index`.
pub fn frame_file_name(index: usize) -> String {
    format!("img{:06}.jpg", index)
}

/// Extract the storyboard frames of `source` into `out_dir`.
pub async fn extract_storyboard(
    extractor: &dyn FrameExtractor,
    source: &Path,
    duration: f64,
    layout: &StoryboardLayout,
    out_dir: &Path,
) -> MediaResult<Vec<StoryboardFrame>> {
    layout.validate()?;
    fs::create_dir_all(out_dir).await?;

    let offsets = layout.sample_offsets(duration);
    debug!(
        frames = offsets.len(),
        duration,
        interval = layout.interval,
        "Extracting storyboard from {}",
        source.display()
    );

    let mut frames = Vec::with_capacity(offsets.len());
    for (index, offset) in offsets.into_iter().enumerate() {
        let path = out_dir.join(frame_file_name(index));
        extractor
            .extract_frame(source, offset, layout.cell_width, layout.cell_height, &path)
            .await?;
        frames.push(StoryboardFrame {
            index,
            path,
            offset,
        });
    }

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records requested offsets and writes a placeholder file.
    #[derive(Default)]
    struct RecordingExtractor {
        offsets: Mutex<Vec<f64>>,
        fail_at: Option<usize>,
    }

    #[async_trait]
    impl FrameExtractor for RecordingExtractor {
        async fn extract_frame(
            &self,
            _source: &Path,
            offset: f64,
            _width: u32,
            _height: u32,
            output: &Path,
        ) -> MediaResult<()> {
            let mut offsets = self.offsets.lock().unwrap();
            if self.fail_at == Some(offsets.len()) {
                return Err(MediaError::FileNotFound(output.to_path_buf()));
            }
            offsets.push(offset);
            std::fs::write(output, b"frame")?;
            Ok(())
        }
    }

    #[test]
    fn test_frame_file_name() {
        assert_eq!(frame_file_name(0), "img000000.jpg");
        assert_eq!(frame_file_name(42), "img000042.jpg");
    }

    #[tokio::test]
    async fn test_extracts_every_offset() {
        let dir = TempDir::new().unwrap();
        let extractor = RecordingExtractor::default();
        let layout = StoryboardLayout::default();

        let frames = extract_storyboard(
            &extractor,
            Path::new("video.mp4"),
            12.0,
            &layout,
            &dir.path().join("thumbs"),
        )
        .await
        .unwrap();

        assert_eq!(*extractor.offsets.lock().unwrap(), vec![1.0, 6.0, 11.0]);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].index, 2);
        assert_eq!(frames[2].offset, 11.0);
        assert!(frames[2].path.ends_with("thumbs/img000002.jpg"));
        assert!(frames.iter().all(|f| f.path.exists()));
    }

    #[tokio::test]
    async fn test_short_video_has_empty_storyboard() {
        let dir = TempDir::new().unwrap();
        let extractor = RecordingExtractor::default();
        let frames = extract_storyboard(
            &extractor,
            Path::new("video.mp4"),
            0.8,
            &StoryboardLayout::default(),
            dir.path(),
        )
        .await
        .unwrap();
        assert!(frames.is_empty());
    }

    #[tokio::test]
    async fn test_missing_frame_aborts() {
        let dir = TempDir::new().unwrap();
        let extractor = RecordingExtractor {
            fail_at: Some(1),
            ..Default::default()
        };
        let result = extract_storyboard(
            &extractor,
            Path::new("video.mp4"),
            30.0,
            &StoryboardLayout::default(),
            dir.path(),
        )
        .await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_layout_is_rejected() {
        let dir = TempDir::new().unwrap();
        let layout = StoryboardLayout {
            interval: -1.0,
            ..Default::default()
        };
        let result = extract_storyboard(
            &RecordingExtractor::default(),
            Path::new("video.mp4"),
            30.0,
            &layout,
            dir.path(),
        )
        .await;
        assert!(matches!(result, Err(MediaError::Layout(_))));
    }
}
