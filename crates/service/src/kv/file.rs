use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;

use super::KeyValueStore;
use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;

/// File-backed substrate.
/// Keeps a map of `key -> value` persisted as a single JSON object.
#[derive(Clone)]
pub struct FileKvStore {
    store: Arc<JsonMapStore<String, String>>,
}

impl FileKvStore {
    /// Initialize the store from the given file path. Creates the file if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonMapStore::<String, String>::new(path).await?;
        Ok(Arc::new(Self { store }))
    }
}

#[async_trait]
impl KeyValueStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        Ok(self.store.get(&key.to_string()).await)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ServiceError> {
        self.store.insert(key.to_string(), value).await
    }

    async fn remove(&self, key: &str) -> Result<bool, ServiceError> {
        self.store.remove(&key.to_string()).await
    }

    async fn keys(&self) -> Result<Vec<String>, ServiceError> {
        let mut keys = self.store.keys().await;
        keys.sort();
        Ok(keys)
    }

    async fn contains(&self, key: &str) -> Result<bool, ServiceError> {
        Ok(self.store.contains_key(&key.to_string()).await)
    }
}
