//! Shared data models for the VHS video backend.
//!
//! This crate provides Serde-serializable types for:
//! - The video entity and its identifiers
//! - Upload channel envelopes and acknowledgments
//! - Storyboard layout, sprite sheets and cue entries
//! - Probe reports and chapter markers

pub mod chapter;
pub mod probe;
pub mod storyboard;
pub mod video;
pub mod ws;

// Re-export common types
pub use chapter::{parse_chapters, Chapter};
pub use probe::{ProbeFormat, ProbeReport, ProbeStream};
pub use storyboard::{
    CellPosition, CellRect, CueEntry, CueTarget, LayoutError, SpriteSheet, StoryboardFrame,
    StoryboardLayout,
};
pub use video::{
    FileRef, UserId, VideoEntity, VideoId, VideoInfo, VideoStatus, VIDEOS_COLLECTION,
    VIDEO_INFO_VERSION,
};
pub use ws::{StartUpload, TransferEnvelope, UploadAck, UploadAckType};
