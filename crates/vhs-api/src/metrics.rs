//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

use crate::session::SessionState;

/// Install the Prometheus recorder and return the handle that renders it.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vhs_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vhs_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vhs_http_requests_in_flight";

    // WebSocket metrics
    pub const WS_CONNECTIONS_TOTAL: &str = "vhs_ws_connections_total";
    pub const WS_CONNECTIONS_ACTIVE: &str = "vhs_ws_connections_active";
    pub const WS_MESSAGES_SENT: &str = "vhs_ws_messages_sent_total";
    pub const WS_MESSAGES_RECEIVED: &str = "vhs_ws_messages_received_total";

    // Upload metrics
    pub const UPLOAD_BYTES_TOTAL: &str = "vhs_upload_bytes_total";
    pub const UPLOADS_TOTAL: &str = "vhs_uploads_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record WebSocket connection.
pub fn record_ws_connection(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::WS_CONNECTIONS_TOTAL, &labels).increment(1);
}

/// Update active WebSocket connections gauge.
pub fn set_ws_active_connections(count: i64) {
    gauge!(names::WS_CONNECTIONS_ACTIVE).set(count as f64);
}

/// Record WebSocket message sent.
pub fn record_ws_message_sent(endpoint: &str, message_type: &str) {
    let labels = [
        ("endpoint", endpoint.to_string()),
        ("type", message_type.to_string()),
    ];
    counter!(names::WS_MESSAGES_SENT, &labels).increment(1);
}

/// Record WebSocket message received.
pub fn record_ws_message_received(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::WS_MESSAGES_RECEIVED, &labels).increment(1);
}

pub fn record_upload_bytes(bytes: usize) {
    counter!(names::UPLOAD_BYTES_TOTAL).increment(bytes as u64);
}

/// Record how an upload session ended.
pub fn record_upload_outcome(state: SessionState) {
    let labels = [("outcome", state.as_str().to_string())];
    counter!(names::UPLOADS_TOTAL, &labels).increment(1);
}

static VIDEO_FILE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/files/videos/[a-zA-Z0-9_-]+/[a-zA-Z0-9_.-]+").expect("valid regex")
});

/// Sanitize path for metrics labels (remove IDs, etc.).
fn sanitize_path(path: &str) -> String {
    VIDEO_FILE_PATH
        .replace_all(path, "/files/videos/:video_id/:file")
        .to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/files/videos/4f2a9c/sheet_1a2b3c4d5e.jpg"),
            "/api/files/videos/:video_id/:file"
        );
        assert_eq!(sanitize_path("/api/videos/upload"), "/api/videos/upload");
        assert_eq!(sanitize_path("/health"), "/health");
    }
}
