use std::{collections::HashMap, hash::Hash, path::PathBuf, sync::Arc};
use tokio::{fs, sync::RwLock};
use tracing::debug;

use crate::errors::ServiceError;

/// Generic JSON file-backed key-value map store.
///
/// Persists a `HashMap<K, V>` to a JSON file and rewrites the whole file on
/// every mutation. A file that exists but does not parse is an error; it is
/// never silently replaced.
#[derive(Clone)]
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Initialize the store from a path. Creates the file with an empty map if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ServiceError::Storage(format!("{} is not a JSON object: {e}", file_path.display()))
            })?,
            Err(_) => {
                let empty: HashMap<K, V> = HashMap::new();
                fs::write(&file_path, serde_json::to_vec(&empty).map_err(ServiceError::storage)?)
                    .await
                    .map_err(ServiceError::storage)?;
                empty
            }
        };
        debug!(path = %file_path.display(), entries = map.len(), "json map store opened");

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path }))
    }

    async fn save(&self) -> Result<(), ServiceError> {
        let map = self.inner.read().await;
        let data = serde_json::to_vec(&*map).map_err(ServiceError::storage)?;
        drop(map);
        fs::write(&self.file_path, data).await.map_err(ServiceError::storage)?;
        Ok(())
    }

    /// List all keys.
    pub async fn keys(&self) -> Vec<K> {
        let map = self.inner.read().await;
        map.keys().cloned().collect()
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    pub async fn contains_key(&self, key: &K) -> bool {
        self.inner.read().await.contains_key(key)
    }

    /// Insert or update a value by key and persist.
    pub async fn insert(&self, key: K, value: V) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        map.insert(key, value);
        drop(map);
        self.save().await
    }

    /// Remove a key and persist; returns whether it existed.
    pub async fn remove(&self, key: &K) -> Result<bool, ServiceError> {
        let mut map = self.inner.write().await;
        let existed = map.remove(key).is_some();
        drop(map);
        if existed {
            self.save().await?;
        }
        Ok(existed)
    }
}
