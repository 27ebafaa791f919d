//! Axum HTTP/WS API server.
//!
//! This crate provides:
//! - The WebSocket upload endpoint and its session state machine
//! - Delivery of stored video assets
//! - Health checks and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod preview;
pub mod routes;
pub mod session;
pub mod state;
pub mod ws;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use session::{
    SessionError, SessionResult, SessionState, UploadContext, UploadSession, DEFAULT_PREVIEW_NAME,
};
pub use state::AppState;
pub use ws::drive_session;
