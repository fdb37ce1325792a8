//! Module of MemStorage and the per-node InformationStore

pub mod memory;

use async_trait::async_trait;

use crate::dht::Id;
use crate::error::Result;
pub use crate::storage::memory::MemStorage;

/// Key value storage interface
#[async_trait]
pub trait KvStorageInterface<K, V> {
    /// Get a cache entry by `key`.
    async fn get(&self, key: &K) -> Result<Option<V>>;

    /// Put `entry` in the cache under `key`.
    async fn put(&self, key: &K, value: &V) -> Result<()>;

    async fn get_all(&self) -> Result<Vec<(K, V)>>;

    /// Remove an `entry` by `key`.
    async fn remove(&self, key: &K) -> Result<()>;

    /// Delete all values.
    async fn clear(&self) -> Result<()>;

    /// Get the current storage usage.
    async fn count(&self) -> Result<u32>;
}

/// `InformationStorage` is the backend of an [InformationStore].
pub type InformationStorage = Box<dyn KvStorageInterface<Id, String> + Send + Sync>;

/// Values a node currently owns. A key lives on exactly one node, its successor.
pub struct InformationStore {
    primary: InformationStorage,
}

impl Default for InformationStore {
    fn default() -> Self {
        Self {
            primary: Box::new(MemStorage::new()),
        }
    }
}

impl InformationStore {
    /// Value stored locally under `key`.
    pub async fn get(&self, key: Id) -> Result<Option<String>> {
        self.primary.get(&key).await
    }

    /// Overwrite the local value of `key`.
    pub async fn put(&self, key: Id, value: &str) -> Result<()> {
        self.primary.put(&key, &value.to_string()).await
    }

    /// Drop `key` locally, missing keys are ignored.
    pub async fn remove(&self, key: Id) -> Result<()> {
        self.primary.remove(&key).await
    }

    /// Every owned pair, sorted by key.
    pub async fn list(&self) -> Result<Vec<(Id, String)>> {
        let mut items = self.primary.get_all().await?;
        items.sort_by_key(|(k, _)| *k);
        Ok(items)
    }

    /// Forget every owned pair.
    pub async fn clear(&self) -> Result<()> {
        self.primary.clear().await
    }

    /// Number of owned pairs.
    pub async fn count(&self) -> Result<u32> {
        self.primary.count().await
    }
}
