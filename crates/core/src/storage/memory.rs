use std::hash::Hash;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::Result;
use crate::storage::KvStorageInterface;

#[derive(Debug, Default)]
pub struct MemStorage<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    table: DashMap<K, V>,
}

impl<K, V> MemStorage<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            table: DashMap::default(),
        }
    }
}

#[async_trait]
impl<K, V> KvStorageInterface<K, V> for MemStorage<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<V>> {
        Ok(self.table.get(key).map(|v| v.value().clone()))
    }

    async fn put(&self, key: &K, value: &V) -> Result<()> {
        self.table.insert(key.clone(), value.clone());
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<(K, V)>> {
        Ok(self
            .table
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect())
    }

    async fn remove(&self, key: &K) -> Result<()> {
        self.table.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.table.clear();
        Ok(())
    }

    async fn count(&self) -> Result<u32> {
        Ok(self.table.len() as u32)
    }
}
