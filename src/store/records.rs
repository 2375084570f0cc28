use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::timeout;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::bin::Bin;
use crate::models::collection::{CollectionEvent, CollectionRequest};
use crate::models::complaint::SegregationComplaint;
use crate::models::impact::EnvironmentalMetrics;
use crate::models::payout::PayoutEvent;
use crate::models::roster::{Collector, ConnectionRequest, RecyclerPartner};
use crate::models::session::Session;
use crate::store::{KvStore, WriteBatch, keys};

/// Typed access to the ledger's records. Decoding happens here, so anything
/// malformed is rejected as a storage failure before the ledger sees it, and
/// every call is bounded by the storage timeout.
#[derive(Clone)]
pub struct Records {
    store: Arc<dyn KvStore>,
    timeout: Duration,
}

impl Records {
    pub fn new(store: Arc<dyn KvStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    async fn bounded<T>(
        &self,
        op: &str,
        fut: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        timeout(self.timeout, fut).await.map_err(|_| {
            AppError::StorageFailure(format!("{op} timed out after {:?}", self.timeout))
        })?
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        let raw = self.bounded(key, self.store.get(key)).await?;
        raw.map(|value| {
            serde_json::from_value(value).map_err(|err| {
                AppError::StorageFailure(format!("malformed record at {key}: {err}"))
            })
        })
        .transpose()
    }

    async fn load_log<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, AppError> {
        Ok(self.load(key).await?.unwrap_or_default())
    }

    pub async fn bin(&self, bin_id: &str) -> Result<Option<Bin>, AppError> {
        let bin: Option<Bin> = self.load(&keys::bin(bin_id)).await?;
        if let Some(bin) = &bin {
            bin.validate()?;
        }
        Ok(bin)
    }

    pub async fn bin_keys(&self) -> Result<Vec<String>, AppError> {
        self.bounded(
            "list bins",
            self.store.list_keys_with_prefix(keys::BIN_PREFIX),
        )
        .await
    }

    pub async fn bins(&self) -> Result<Vec<Bin>, AppError> {
        let mut bins = Vec::new();
        for key in self.bin_keys().await? {
            let Some(bin_id) = key.strip_prefix(keys::BIN_PREFIX) else {
                continue;
            };
            if let Some(bin) = self.bin(bin_id).await? {
                bins.push(bin);
            }
        }
        Ok(bins)
    }

    pub async fn collection_events(&self) -> Result<Vec<CollectionEvent>, AppError> {
        self.load_log(keys::COLLECTION_EVENTS).await
    }

    pub async fn payout_events(&self) -> Result<Vec<PayoutEvent>, AppError> {
        self.load_log(keys::PAYOUT_EVENTS).await
    }

    pub async fn collection_requests(&self) -> Result<Vec<CollectionRequest>, AppError> {
        self.load_log(keys::COLLECTION_REQUESTS).await
    }

    pub async fn environmental_metrics(&self) -> Result<Vec<EnvironmentalMetrics>, AppError> {
        self.load_log(keys::ENVIRONMENTAL_METRICS).await
    }

    pub async fn collectors(&self) -> Result<Option<Vec<Collector>>, AppError> {
        self.load(keys::COLLECTORS).await
    }

    pub async fn recycler_partners(&self) -> Result<Option<Vec<RecyclerPartner>>, AppError> {
        self.load(keys::RECYCLER_PARTNERS).await
    }

    pub async fn current_session(&self) -> Result<Option<Session>, AppError> {
        self.load(keys::CURRENT_SESSION).await
    }

    pub async fn segregation_complaints(&self) -> Result<Vec<SegregationComplaint>, AppError> {
        self.load_log(keys::SEGREGATION_COMPLAINTS).await
    }

    pub async fn connection_request(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<ConnectionRequest>, AppError> {
        self.load(&keys::connection_request(request_id)).await
    }

    /// Connection requests are stored one per key.
    pub async fn connection_requests(&self) -> Result<Vec<ConnectionRequest>, AppError> {
        let request_keys = self
            .bounded(
                "list connection requests",
                self.store.list_keys_with_prefix(keys::CONNECTION_REQUEST_PREFIX),
            )
            .await?;

        let mut requests = Vec::with_capacity(request_keys.len());
        for key in request_keys {
            if let Some(request) = self.load(&key).await? {
                requests.push(request);
            }
        }
        Ok(requests)
    }

    pub async fn commit(&self, batch: WriteBatch) -> Result<(), AppError> {
        if batch.is_empty() {
            return Ok(());
        }
        // A batch handed to the store is applied whole or not at all, even
        // when this call gives up waiting on it.
        timeout(self.timeout, self.store.set_many(batch.into_entries()))
            .await
            .map_err(|_| {
                AppError::StorageFailure(format!(
                    "commit timed out after {:?}; the batch may still be applied",
                    self.timeout
                ))
            })?
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::Records;
    use crate::error::{AppError, ErrorKind};
    use crate::store::{KvStore, MemoryStore};

    struct StalledStore;

    #[async_trait]
    impl KvStore for StalledStore {
        async fn get(&self, _key: &str) -> Result<Option<Value>, AppError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: Value) -> Result<(), AppError> {
            Ok(())
        }

        async fn set_many(&self, _entries: Vec<(String, Value)>) -> Result<(), AppError> {
            Ok(())
        }

        async fn list_keys_with_prefix(&self, _prefix: &str) -> Result<Vec<String>, AppError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn slow_store_times_out_as_storage_failure() {
        let records = Records::new(Arc::new(StalledStore), Duration::from_millis(20));
        let err = records.collection_events().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageFailure);
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn malformed_bin_record_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("bin:BIN-X", json!({ "binId": "BIN-X", "sensors": "full" }))
            .await
            .unwrap();

        let records = Records::new(store, Duration::from_secs(1));
        let err = records.bin("BIN-X").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageFailure);
    }

    #[tokio::test]
    async fn missing_logs_read_as_empty() {
        let records = Records::new(Arc::new(MemoryStore::new()), Duration::from_secs(1));
        assert!(records.payout_events().await.unwrap().is_empty());
        assert!(records.collectors().await.unwrap().is_none());
    }
}
