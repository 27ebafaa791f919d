//! Record store collaborator.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use vhs_models::{UserId, VideoEntity, VideoId, VIDEOS_COLLECTION};

use crate::auth::JwtTokenResolver;
use crate::error::{StoreError, StoreResult};
use crate::schema::SchemaCache;

/// Persistence for video records and upload-token resolution.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new record.
    async fn create(&self, video: VideoEntity) -> StoreResult<VideoEntity>;

    /// Load a record by id.
    async fn find_by_id(&self, id: &VideoId) -> StoreResult<VideoEntity>;

    /// Overwrite an existing record.
    async fn save(&self, video: &VideoEntity) -> StoreResult<()>;

    /// Resolve an upload token to its user.
    async fn resolve_auth_token(&self, token: &str) -> StoreResult<UserId>;
}

/// Process-local [`RecordStore`].
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<VideoId, VideoEntity>>,
    schemas: SchemaCache,
    tokens: JwtTokenResolver,
}

impl InMemoryRecordStore {
    pub fn new(tokens: JwtTokenResolver) -> Self {
        Self::with_schemas(tokens, SchemaCache::default())
    }

    pub fn with_schemas(tokens: JwtTokenResolver, schemas: SchemaCache) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            schemas,
            tokens,
        }
    }

    /// Number of stored records.
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }

    /// All records, in no particular order.
    pub async fn all(&self) -> Vec<VideoEntity> {
        self.records.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create(&self, video: VideoEntity) -> StoreResult<VideoEntity> {
        let schema = self.schemas.get(VIDEOS_COLLECTION).await?;
        schema.check(&serde_json::to_value(&video)?)?;

        let mut records = self.records.write().await;
        if records.contains_key(&video.id) {
            return Err(StoreError::AlreadyExists(video.id.to_string()));
        }
        records.insert(video.id.clone(), video.clone());

        debug!(video_id = %video.id, owner = %video.owner, "Created video record");
        Ok(video)
    }

    async fn find_by_id(&self, id: &VideoId) -> StoreResult<VideoEntity> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(id.to_string()))
    }

    async fn save(&self, video: &VideoEntity) -> StoreResult<()> {
        let mut records = self.records.write().await;
        match records.get_mut(&video.id) {
            Some(existing) => {
                *existing = video.clone();
                Ok(())
            }
            None => Err(StoreError::not_found(video.id.to_string())),
        }
    }

    async fn resolve_auth_token(&self, token: &str) -> StoreResult<UserId> {
        self.tokens.resolve(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::issue_token;
    use vhs_models::FileRef;

    const SECRET: &str = "record_secret";

    fn store() -> InMemoryRecordStore {
        InMemoryRecordStore::new(JwtTokenResolver::new(SECRET))
    }

    fn placeholder() -> VideoEntity {
        let mut video = VideoEntity::placeholder(UserId::new("u1"), "clip.mp4");
        video.preview = Some(FileRef::new("preview.jpg"));
        video
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = store();
        let video = store.create(placeholder()).await.unwrap();
        let found = store.find_by_id(&video.id).await.unwrap();
        assert_eq!(found, video);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let store = store();
        let video = store.create(placeholder()).await.unwrap();
        let err = store.create(video).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_create_checks_schema() {
        let store = store();
        let mut video = placeholder();
        video.preview = None;
        let err = store.create(video).await.unwrap_err();
        assert!(matches!(err, StoreError::SchemaViolation { .. }));
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = store();
        let mut video = store.create(placeholder()).await.unwrap();
        video.duration = Some(12.0);
        store.save(&video).await.unwrap();
        assert_eq!(
            store.find_by_id(&video.id).await.unwrap().duration,
            Some(12.0)
        );
    }

    #[tokio::test]
    async fn test_save_unknown_record() {
        let err = store().save(&placeholder()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_auth_token() {
        let store = store();
        let token = issue_token(&UserId::new("u9"), SECRET, chrono::Duration::minutes(5)).unwrap();
        assert_eq!(
            store.resolve_auth_token(&token).await.unwrap(),
            UserId::new("u9")
        );
        assert!(store.resolve_auth_token("nope").await.unwrap_err().is_auth());
    }
}
