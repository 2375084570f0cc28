use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::AppError;
use crate::store::KvStore;

/// Keeps the whole namespace in one JSON document on disk.
///
/// Every write rewrites the document to a sibling temp file and renames it
/// over the original, so a crash leaves either the old or the new contents.
/// The in-memory copy is only replaced after the rename succeeds.
pub struct FileStore {
    inner: Arc<Document>,
}

struct Document {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl FileStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
                AppError::StorageFailure(format!("corrupt store file {}: {err}", path.display()))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(AppError::StorageFailure(format!(
                    "failed to read {}: {err}",
                    path.display()
                )));
            }
        };

        info!(path = %path.display(), records = entries.len(), "file store opened");

        Ok(Self {
            inner: Arc::new(Document {
                path,
                entries: Mutex::new(entries),
            }),
        })
    }
}

impl Document {
    async fn apply(&self, batch: Vec<(String, Value)>) -> Result<(), AppError> {
        let mut entries = self.entries.lock().await;

        let mut next = entries.clone();
        next.extend(batch);
        self.persist(&next).await?;

        *entries = next;
        Ok(())
    }

    async fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<(), AppError> {
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|err| AppError::StorageFailure(format!("failed to encode store: {err}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|err| {
                AppError::StorageFailure(format!("failed to create {}: {err}", parent.display()))
            })?;
        }

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &bytes).await.map_err(|err| {
            AppError::StorageFailure(format!("failed to write {}: {err}", tmp_path.display()))
        })?;
        fs::rename(&tmp_path, &self.path).await.map_err(|err| {
            AppError::StorageFailure(format!("failed to replace {}: {err}", self.path.display()))
        })?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "store flushed");
        Ok(())
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
        Ok(self.inner.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), AppError> {
        self.set_many(vec![(key.to_string(), value)]).await
    }

    /// The write runs on its own task. Once started it completes, on disk and
    /// in memory, even if the caller stops waiting for it.
    async fn set_many(&self, batch: Vec<(String, Value)>) -> Result<(), AppError> {
        let document = Arc::clone(&self.inner);

        tokio::spawn(async move { document.apply(batch).await })
            .await
            .map_err(|err| AppError::StorageFailure(format!("store write task failed: {err}")))?
    }

    async fn list_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        Ok(self
            .inner
            .entries
            .lock()
            .await
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use uuid::Uuid;

    use super::FileStore;
    use crate::store::KvStore;

    fn scratch_path() -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("bin-ledger-{}", Uuid::new_v4()))
            .join("store.json")
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let path = scratch_path();

        let store = FileStore::open(&path).await.unwrap();
        store.set("bin:BIN-1", json!({ "binId": "BIN-1" })).await.unwrap();
        store.set("collectors", json!([])).await.unwrap();
        drop(store);

        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.get("bin:BIN-1").await.unwrap(),
            Some(json!({ "binId": "BIN-1" }))
        );
        assert_eq!(
            reopened.list_keys_with_prefix("bin:").await.unwrap(),
            vec!["bin:BIN-1".to_string()]
        );

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn abandoned_write_lands_in_memory_and_on_disk() {
        let path = scratch_path();
        let store = FileStore::open(&path).await.unwrap();

        // The caller gives up before the write task gets to run.
        let _ = tokio::time::timeout(
            Duration::ZERO,
            store.set("bin:BIN-1", json!({ "binId": "BIN-1" })),
        )
        .await;

        // Writes are applied in order, so this one finishes after the first.
        store.set("collectors", json!([])).await.unwrap();

        assert_eq!(
            store.get("bin:BIN-1").await.unwrap(),
            Some(json!({ "binId": "BIN-1" }))
        );
        drop(store);

        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.get("bin:BIN-1").await.unwrap(),
            Some(json!({ "binId": "BIN-1" }))
        );
        assert_eq!(reopened.get("collectors").await.unwrap(), Some(json!([])));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_failure() {
        let path = scratch_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{ not json").unwrap();

        let err = FileStore::open(&path).await.err().unwrap();
        assert!(err.to_string().contains("corrupt store file"));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
