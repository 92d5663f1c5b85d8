//! The key-value substrate carts and credentials live in.
//!
//! String keys, string values, whole-value reads and writes. Implementations
//! can be in-memory or file-backed.

use async_trait::async_trait;

use crate::errors::ServiceError;

pub mod file;
pub mod memory;

pub use file::FileKvStore;
pub use memory::MemoryKvStore;

/// Substrate key holding the bearer credential.
pub const TOKEN_KEY: &str = "token";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError>;
    async fn set(&self, key: &str, value: String) -> Result<(), ServiceError>;
    /// Remove a key; returns whether it existed.
    async fn remove(&self, key: &str) -> Result<bool, ServiceError>;
    async fn keys(&self) -> Result<Vec<String>, ServiceError>;

    async fn contains(&self, key: &str) -> Result<bool, ServiceError> {
        Ok(self.get(key).await?.is_some())
    }
}
