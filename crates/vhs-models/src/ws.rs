//! Upload channel message types.
//!
//! The client drives the transfer with a JSON start request, a series of
//! binary chunks and an optional close. Every envelope is answered with
//! exactly one [`UploadAck`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::video::VideoId;

/// Payload of the start envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct StartUpload {
    /// Total size of the upload in bytes
    #[validate(range(min = 1, message = "size must be greater than zero"))]
    pub size: u64,

    /// Display name of the video
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,

    /// Auth token of the uploader
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
}

/// One discrete message received over the upload channel.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEnvelope {
    Start(StartUpload),
    Chunk(Vec<u8>),
    Cancel,
}

impl TransferEnvelope {
    pub fn kind(&self) -> &'static str {
        match self {
            TransferEnvelope::Start(_) => "start",
            TransferEnvelope::Chunk(_) => "chunk",
            TransferEnvelope::Cancel => "cancel",
        }
    }
}

/// Acknowledgment types (the wire values are fixed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UploadAckType {
    /// Envelope accepted, transfer continues
    Part,
    /// Transfer complete, processing scheduled
    End,
    /// Transfer cancelled
    Cancel,
    /// Session failed
    Error,
}

impl UploadAckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadAckType::Part => "part",
            UploadAckType::End => "end",
            UploadAckType::Cancel => "cancel",
            UploadAckType::Error => "error",
        }
    }
}

/// Server-to-client acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UploadAck {
    #[serde(rename = "type")]
    pub ack_type: UploadAckType,

    #[serde(rename = "videoId", skip_serializing_if = "Option::is_none")]
    pub video_id: Option<VideoId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadAck {
    pub fn part(video_id: Option<VideoId>) -> Self {
        Self {
            ack_type: UploadAckType::Part,
            video_id,
            error: None,
        }
    }

    pub fn end(video_id: VideoId) -> Self {
        Self {
            ack_type: UploadAckType::End,
            video_id: Some(video_id),
            error: None,
        }
    }

    pub fn cancel() -> Self {
        Self {
            ack_type: UploadAckType::Cancel,
            video_id: None,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ack_type: UploadAckType::Error,
            video_id: None,
            error: Some(message.into()),
        }
    }

    /// Whether the session is over once this ack is sent.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.ack_type, UploadAckType::Part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_payload_parsing() {
        let start: StartUpload =
            serde_json::from_str(r#"{"size": 1024, "name": "clip.mp4", "token": "t"}"#).unwrap();
        assert_eq!(start.size, 1024);
        assert!(start.validate().is_ok());
    }

    #[test]
    fn test_start_payload_validation() {
        let start = StartUpload {
            size: 0,
            name: "clip.mp4".to_string(),
            token: "t".to_string(),
        };
        assert!(start.validate().is_err());

        let start = StartUpload {
            size: 10,
            name: String::new(),
            token: "t".to_string(),
        };
        assert!(start.validate().is_err());
    }

    #[test]
    fn test_negative_size_is_rejected_by_parser() {
        let parsed: Result<StartUpload, _> =
            serde_json::from_str(r#"{"size": -5, "name": "a", "token": "t"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_ack_serialization() {
        let json = serde_json::to_value(UploadAck::part(Some(VideoId::from("v1")))).unwrap();
        assert_eq!(json, serde_json::json!({"type": "part", "videoId": "v1"}));

        let json = serde_json::to_value(UploadAck::part(None)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "part"}));

        let json = serde_json::to_value(UploadAck::error("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "error", "error": "boom"}));
    }

    #[test]
    fn test_terminal_acks() {
        assert!(!UploadAck::part(None).is_terminal());
        assert!(UploadAck::end(VideoId::from("v")).is_terminal());
        assert!(UploadAck::cancel().is_terminal());
        assert!(UploadAck::error("x").is_terminal());
    }
}
