//! Record and file store collaborators.
//!
//! This crate provides:
//! - The `RecordStore` trait and a process-local implementation
//! - The `FileStore` trait and a local-disk implementation
//! - HS256 upload-token resolution
//! - A lazily populated collection schema cache

pub mod auth;
pub mod config;
pub mod error;
pub mod file;
pub mod record;
pub mod schema;

pub use auth::{issue_token, JwtTokenResolver, TokenClaims};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use file::{FileSource, FileStore, LocalFileStore, DEFAULT_PUBLIC_BASE};
pub use record::{InMemoryRecordStore, RecordStore};
pub use schema::{BuiltinSchemas, CollectionSchema, FieldSchema, SchemaCache, SchemaLoader};
