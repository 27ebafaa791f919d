//! FFprobe-backed media probe.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use vhs_models::{ProbeFormat, ProbeReport, ProbeStream};

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Extracts duration and stream metadata from a media file.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> MediaResult<ProbeReport>;
}

/// [`MediaProbe`] that shells out to `ffprobe`.
#[derive(Debug, Clone, Default)]
pub struct FfprobeProbe;

impl FfprobeProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn probe(&self, path: &Path) -> MediaResult<ProbeReport> {
        probe_video(path).await
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    format_long_name: Option<String>,
    nb_streams: Option<u32>,
    duration: Option<String>,
    size: Option<String>,
    bit_rate: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    bit_rate: Option<String>,
}

/// Probe a video file for information.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<ProbeReport> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let ffprobe = check_ffprobe()?;
    debug!("Probing {}", path.display());

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe failed for {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_ffprobe_output(&output.stdout)
}

/// Convert raw `ffprobe -print_format json` output into a report.
///
/// Fails when the file has no video stream or no usable duration.
pub fn parse_ffprobe_output(raw: &[u8]) -> MediaResult<ProbeReport> {
    let probe: FfprobeOutput = serde_json::from_slice(raw)?;

    let format = probe
        .format
        .map(|f| ProbeFormat {
            format_name: f.format_name.unwrap_or_default(),
            format_long_name: f.format_long_name.unwrap_or_default(),
            nb_streams: f.nb_streams.unwrap_or_default(),
            duration: parse_number(f.duration.as_deref()),
            size: parse_number(f.size.as_deref()),
            bit_rate: parse_number(f.bit_rate.as_deref()),
            tags: f.tags,
        })
        .unwrap_or_default();

    let streams = probe
        .streams
        .into_iter()
        .map(|s| ProbeStream {
            index: s.index,
            codec_type: s.codec_type.unwrap_or_default(),
            codec_name: s.codec_name.unwrap_or_default(),
            width: s.width,
            height: s.height,
            duration: parse_number(s.duration.as_deref()),
            frame_rate: s
                .avg_frame_rate
                .as_deref()
                .and_then(parse_frame_rate)
                .or_else(|| s.r_frame_rate.as_deref().and_then(parse_frame_rate)),
            bit_rate: parse_number(s.bit_rate.as_deref()),
        })
        .collect();

    let report = ProbeReport { format, streams };

    if report.video_stream().is_none() {
        return Err(MediaError::InvalidVideo("No video stream found".to_string()));
    }
    if report.duration().is_none() {
        return Err(MediaError::InvalidVideo("Duration is missing".to_string()));
    }

    Ok(report)
}

fn parse_number<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    s.parse().ok()
}
