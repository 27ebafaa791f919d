//! Collection schema cache.
//!
//! Schemas are loaded on first access and kept for the life of the process.
//! Two tasks missing the same name at once both load it; the later insert
//! overwrites an identical value.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use vhs_models::VIDEOS_COLLECTION;

use crate::error::{StoreError, StoreResult};

/// A field of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: String,
    pub required: bool,
}

impl FieldSchema {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }
}

/// Shape of a record collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    pub name: String,
    pub fields: Vec<FieldSchema>,
}

impl CollectionSchema {
    /// Check that every required field is present and non-null.
    pub fn check(&self, record: &Value) -> StoreResult<()> {
        for field in self.fields.iter().filter(|f| f.required) {
            let present = record
                .get(&field.name)
                .is_some_and(|v| !v.is_null() && v.as_str() != Some(""));
            if !present {
                return Err(StoreError::SchemaViolation {
                    collection: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Source of collection schemas.
#[async_trait]
pub trait SchemaLoader: Send + Sync {
    async fn load(&self, name: &str) -> StoreResult<CollectionSchema>;
}

/// Loader for the collections this backend defines.
#[derive(Debug, Clone, Default)]
pub struct BuiltinSchemas;

#[async_trait]
impl SchemaLoader for BuiltinSchemas {
    async fn load(&self, name: &str) -> StoreResult<CollectionSchema> {
        match name {
            VIDEOS_COLLECTION => Ok(CollectionSchema {
                name: VIDEOS_COLLECTION.to_string(),
                fields: vec![
                    FieldSchema::required("id"),
                    FieldSchema::required("name"),
                    FieldSchema::required("owner"),
                    FieldSchema::required("status"),
                    FieldSchema::required("preview"),
                    FieldSchema::optional("description"),
                    FieldSchema::optional("video_file"),
                    FieldSchema::optional("thumbnails"),
                    FieldSchema::optional("cue_file"),
                    FieldSchema::optional("duration"),
                    FieldSchema::optional("info"),
                ],
            }),
            other => Err(StoreError::UnknownCollection(other.to_string())),
        }
    }
}

/// Lazily populated, never evicted map of collection schemas.
pub struct SchemaCache {
    loader: Arc<dyn SchemaLoader>,
    schemas: RwLock<HashMap<String, Arc<CollectionSchema>>>,
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(Arc::new(BuiltinSchemas))
    }
}

impl SchemaCache {
    pub fn new(loader: Arc<dyn SchemaLoader>) -> Self {
        Self {
            loader,
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// Get a schema, loading it on first access.
    pub async fn get(&self, name: &str) -> StoreResult<Arc<CollectionSchema>> {
        if let Some(schema) = self.schemas.read().await.get(name) {
            return Ok(Arc::clone(schema));
        }

        // Loaded without holding the lock; concurrent misses load redundantly.
        let schema = Arc::new(self.loader.load(name).await?);
        debug!(collection = name, "Loaded collection schema");

        self.schemas
            .write()
            .await
            .insert(name.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Number of cached schemas.
    pub async fn len(&self) -> usize {
        self.schemas.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.schemas.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingLoader {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl SchemaLoader for CountingLoader {
        async fn load(&self, name: &str) -> StoreResult<CollectionSchema> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            BuiltinSchemas.load(name).await
        }
    }

    #[tokio::test]
    async fn test_loads_once() {
        let loader = Arc::new(CountingLoader::default());
        let cache = SchemaCache::new(loader.clone());
        assert!(cache.is_empty().await);

        let first = cache.get(VIDEOS_COLLECTION).await.unwrap();
        let second = cache.get(VIDEOS_COLLECTION).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_collection_is_not_cached() {
        let cache = SchemaCache::default();
        let err = cache.get("playlists").await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownCollection(_)));
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let cache = Arc::new(SchemaCache::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get(VIDEOS_COLLECTION).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().name, VIDEOS_COLLECTION);
        }
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_check_required_fields() {
        let schema = BuiltinSchemas.load(VIDEOS_COLLECTION).await.unwrap();
        let ok = json!({"id": "v1", "name": "a", "owner": "u", "status": "closed", "preview": "p.jpg"});
        assert!(schema.check(&ok).is_ok());

        let missing = json!({"id": "v1", "name": "a", "owner": "u", "status": "closed"});
        match schema.check(&missing) {
            Err(StoreError::SchemaViolation { field, .. }) => assert_eq!(field, "preview"),
            other => panic!("expected schema violation, got {:?}", other),
        }

        let empty_name = json!({"id": "v1", "name": "", "owner": "u", "status": "closed", "preview": "p"});
        assert!(schema.check(&empty_name).is_err());
    }
}
