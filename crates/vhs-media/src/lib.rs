#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper and storyboard builder.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a timeout-aware runner
//! - Media probing via `ffprobe`
//! - Single-frame extraction for previews and storyboards
//! - Sprite sheet packing and WebVTT cue generation

pub mod command;
pub mod cue;
pub mod error;
pub mod frame;
pub mod probe;
pub mod sprite;
pub mod storyboard;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use cue::{build_cues, format_timestamp, render_webvtt, write_cue_file};
pub use error::{MediaError, MediaResult};
pub use frame::{FfmpegFrameExtractor, FrameExtractor};
pub use probe::{probe_video, FfprobeProbe, MediaProbe};
pub use sprite::{build_sprite_sheets, plan_sheets, render_sheet, sheet_file_name};
pub use storyboard::{extract_storyboard, frame_file_name};
