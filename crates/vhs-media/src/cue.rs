//! Cue track generation.
//!
//! Frame `k` covers `[k * interval, (k + 1) * interval)`; the last cue always
//! ends at the video duration. Cues point at the frame's rectangle in its
//! sprite sheet and are serialized as WebVTT.

use std::fmt::Write as _;
use std::path::Path;

use tokio::fs;

use vhs_models::{CueEntry, CueTarget, StoryboardLayout};

use crate::error::{MediaError, MediaResult};

/// First line of every cue file.
pub const WEBVTT_HEADER: &str = "WEBVTT";

/// Build the cue entries for `frame_count` frames.
///
/// `sheet_urls` holds the public URL of each sheet, in sheet order.
pub fn build_cues(
    frame_count: usize,
    duration: f64,
    layout: &StoryboardLayout,
    sheet_urls: &[String],
) -> MediaResult<Vec<CueEntry>> {
    let expected = layout.sheet_count(frame_count);
    if sheet_urls.len() != expected {
        return Err(MediaError::internal(format!(
            "{} frames need {} sheet URLs, got {}",
            frame_count,
            expected,
            sheet_urls.len()
        )));
    }

    let cues = (0..frame_count)
        .map(|k| {
            let start = k as f64 * layout.interval;
            let end = if k + 1 == frame_count {
                duration
            } else {
                ((k + 1) as f64 * layout.interval).min(duration)
            };
            CueEntry {
                start,
                end: end.max(start),
                target: CueTarget {
                    sheet_url: sheet_urls[layout.cell_for(k).sheet].clone(),
                    rect: layout.cell_rect(k),
                },
            }
        })
        .collect();

    Ok(cues)
}

/// Format seconds as `HH:MM:SS.mmm`.
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60,
        ms
    )
}

/// Serialize cues as a WebVTT document.
pub fn render_webvtt(cues: &[CueEntry]) -> String {
    let mut out = String::from(WEBVTT_HEADER);
    out.push_str("\n\n");
    for cue in cues {
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "{} --> {}\n{}\n\n",
            format_timestamp(cue.start),
            format_timestamp(cue.end),
            cue.target.to_fragment_url()
        );
    }
    out
}

/// Write the cue file for `cues` to `path`.
pub async fn write_cue_file(cues: &[CueEntry], path: &Path) -> MediaResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, render_webvtt(cues)).await?;
    Ok(())
}
