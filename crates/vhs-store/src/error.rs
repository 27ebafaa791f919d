//! Store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the record and file stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Field '{field}' is required in collection '{collection}'")]
    SchemaViolation { collection: String, field: String },

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Failed to configure store: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error is an authentication failure of any kind.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::Auth(_) | Self::InvalidToken(_) | Self::TokenExpired
        )
    }
}
