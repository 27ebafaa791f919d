//! Technical metadata reported by the media probe.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Container-level information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProbeFormat {
    #[serde(default)]
    pub format_name: String,
    #[serde(default)]
    pub format_long_name: String,
    #[serde(default)]
    pub nb_streams: u32,
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    /// Size in bytes
    #[serde(default)]
    pub size: Option<u64>,
    /// Bitrate in bits/second
    #[serde(default)]
    pub bit_rate: Option<u64>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// A single elementary stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProbeStream {
    pub index: u32,
    /// "video", "audio", "subtitle", ...
    pub codec_type: String,
    #[serde(default)]
    pub codec_name: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    /// Frame rate (fps)
    #[serde(default)]
    pub frame_rate: Option<f64>,
    #[serde(default)]
    pub bit_rate: Option<u64>,
}

/// Full probe report for a media file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProbeReport {
    pub format: ProbeFormat,
    pub streams: Vec<ProbeStream>,
}

impl ProbeReport {
    /// First video stream, if any.
    pub fn video_stream(&self) -> Option<&ProbeStream> {
        self.streams.iter().find(|s| s.codec_type == "video")
    }

    /// Duration of the video, preferring the video stream over the container.
    pub fn duration(&self) -> Option<f64> {
        self.video_stream()
            .and_then(|s| s.duration)
            .or(self.format.duration)
            .filter(|d| d.is_finite() && *d >= 0.0)
    }
}
