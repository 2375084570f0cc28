use std::sync::RwLock;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::error::AppError;
use crate::store::KvStore;

/// Process-local store. Single-key reads and writes go straight to the map;
/// the batch gate only keeps `set_many` from being observed halfway.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Value>,
    batch_gate: RwLock<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn read_gate(&self) -> Result<std::sync::RwLockReadGuard<'_, ()>, AppError> {
        self.batch_gate
            .read()
            .map_err(|_| AppError::StorageFailure("memory store lock poisoned".to_string()))
    }

    fn write_gate(&self) -> Result<std::sync::RwLockWriteGuard<'_, ()>, AppError> {
        self.batch_gate
            .write()
            .map_err(|_| AppError::StorageFailure("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
        let _gate = self.read_gate()?;
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), AppError> {
        let _gate = self.read_gate()?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), AppError> {
        let _gate = self.write_gate()?;
        for (key, value) in entries {
            self.entries.insert(key, value);
        }
        Ok(())
    }

    async fn list_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        let _gate = self.read_gate()?;
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::MemoryStore;
    use crate::store::KvStore;

    #[tokio::test]
    async fn prefix_listing_is_sorted_and_filtered() {
        let store = MemoryStore::new();
        store.set("bin:B", json!(2)).await.unwrap();
        store.set("bin:A", json!(1)).await.unwrap();
        store.set("collectors", json!([])).await.unwrap();

        let keys = store.list_keys_with_prefix("bin:").await.unwrap();
        assert_eq!(keys, vec!["bin:A".to_string(), "bin:B".to_string()]);
    }

    #[tokio::test]
    async fn batch_writes_every_entry() {
        let store = MemoryStore::new();
        store
            .set_many(vec![
                ("a".to_string(), json!("x")),
                ("b".to_string(), json!("y")),
            ])
            .await
            .unwrap();

        assert_eq!(store.get("a").await.unwrap(), Some(json!("x")));
        assert_eq!(store.get("b").await.unwrap(), Some(json!("y")));
        assert_eq!(store.get("c").await.unwrap(), None);
        assert_eq!(store.len(), 2);
    }
}
