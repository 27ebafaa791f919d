//! Store configuration.

use std::path::PathBuf;

use crate::error::{StoreError, StoreResult};
use crate::file::DEFAULT_PUBLIC_BASE;

/// Configuration for the record and file stores.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root of persisted video assets
    pub files_dir: PathBuf,
    /// Prefix of public file URLs
    pub public_base_url: String,
    /// HS256 secret for upload tokens
    pub jwt_secret: String,
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        Ok(Self {
            files_dir: std::env::var("VHS_FILES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data/files")),
            public_base_url: std::env::var("VHS_PUBLIC_FILES_URL")
                .unwrap_or_else(|_| DEFAULT_PUBLIC_BASE.to_string()),
            jwt_secret: std::env::var("VHS_JWT_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| StoreError::config("VHS_JWT_SECRET not set"))?,
        })
    }
}
