//! Stored asset delivery.
//!
//! Serves the URLs produced by the file store's public URL scheme, so cue
//! tracks and thumbnails resolve against this server.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use vhs_models::{FileRef, VideoId};

use crate::error::ApiResult;
use crate::state::AppState;

/// Serve one stored file of a video.
pub async fn get_video_file(
    State(state): State<AppState>,
    Path((video_id, file)): Path<(String, String)>,
) -> ApiResult<Response> {
    let video_id = VideoId::from_string(video_id);
    let file = FileRef::new(file);

    let data = state.upload.files.read(&video_id, &file).await?;
    let content_type = content_type_for(file.as_str());

    Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}

fn content_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "vtt" => "text/vtt; charset=utf-8",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}
