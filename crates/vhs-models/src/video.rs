//! Video entity models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::chapter::{parse_chapters, Chapter};
use crate::probe::ProbeReport;

/// Name of the collection video records live in.
pub const VIDEOS_COLLECTION: &str = "videos";

/// Current version of the [`VideoInfo`] blob layout.
pub const VIDEO_INFO_VERSION: u32 = 1;

/// Unique identifier for an uploaded video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a file persisted by the file store, scoped to its video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct FileRef(pub String);

impl FileRef {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Publish status of a video. Controlled by the owner, not by processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Visible to the owner only
    #[default]
    Closed,
    /// Visible to anyone with the link
    Link,
    /// Listed publicly
    Public,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Closed => "closed",
            VideoStatus::Link => "link",
            VideoStatus::Public => "public",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Versioned blob for technical data that lives outside the fixed schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoInfo {
    /// Layout version of this blob
    #[serde(default = "default_info_version")]
    pub version: u32,

    /// Probe output for the source file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ProbeReport>,

    /// Chapters parsed from the description
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

fn default_info_version() -> u32 {
    VIDEO_INFO_VERSION
}

/// A video record as persisted by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoEntity {
    /// Unique video ID
    pub id: VideoId,

    /// Display name
    pub name: String,

    /// Free-text description (chapter markers are parsed from it)
    #[serde(default)]
    pub description: String,

    /// Publish status
    #[serde(default)]
    pub status: VideoStatus,

    /// Owner
    pub owner: UserId,

    /// Source video asset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_file: Option<FileRef>,

    /// Preview image asset. Always present once the placeholder is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<FileRef>,

    /// Whether the preview was chosen explicitly by the uploader
    #[serde(default)]
    pub preview_set: bool,

    /// Sprite sheets, in ascending time order
    #[serde(default)]
    pub thumbnails: Vec<FileRef>,

    /// WebVTT cue file over the sprite sheets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cue_file: Option<FileRef>,

    /// Duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Extra technical metadata
    #[serde(default)]
    pub info: VideoInfo,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl VideoEntity {
    /// Create the placeholder record written when an upload starts.
    pub fn placeholder(owner: UserId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: VideoId::new(),
            name: name.into(),
            description: String::new(),
            status: VideoStatus::Closed,
            owner,
            video_file: None,
            preview: None,
            preview_set: false,
            thumbnails: Vec::new(),
            cue_file: None,
            duration: None,
            info: VideoInfo {
                version: VIDEO_INFO_VERSION,
                ..Default::default()
            },
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the description and reparse its chapter markers.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.info.chapters = parse_chapters(&self.description);
    }

    /// Set a preview picked by the uploader.
    pub fn set_explicit_preview(&mut self, preview: FileRef) {
        self.preview = Some(preview);
        self.preview_set = true;
    }

    /// Bump the update timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
