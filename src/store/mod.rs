//! Flat key-value persistence.
//!
//! Every record is a whole JSON value under a string key. Multi-record
//! mutations go through [`KvStore::set_many`], which implementations apply as
//! one unit so a reader never observes half of a batch.

pub mod file;
pub mod memory;
pub mod records;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use records::Records;

pub mod keys {
    pub const BIN_PREFIX: &str = "bin:";
    pub const COLLECTION_EVENTS: &str = "collectionEvents";
    pub const PAYOUT_EVENTS: &str = "payoutEvents";
    pub const COLLECTORS: &str = "collectors";
    pub const RECYCLER_PARTNERS: &str = "recyclerPartners";
    pub const COLLECTION_REQUESTS: &str = "collectionRequests";
    pub const ENVIRONMENTAL_METRICS: &str = "environmentalMetrics";
    pub const CURRENT_SESSION: &str = "sessions:current";
    pub const SEGREGATION_COMPLAINTS: &str = "segregationComplaints";
    pub const CONNECTION_REQUEST_PREFIX: &str = "connectionRequest:";

    pub fn bin(bin_id: &str) -> String {
        format!("{BIN_PREFIX}{bin_id}")
    }

    pub fn connection_request(request_id: &uuid::Uuid) -> String {
        format!("{CONNECTION_REQUEST_PREFIX}{request_id}")
    }
}

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), AppError>;

    /// Writes all entries or none of them.
    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), AppError>;

    async fn list_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, AppError>;
}

/// Entries to be committed together through [`KvStore::set_many`].
#[derive(Debug, Default)]
pub struct WriteBatch {
    entries: Vec<(String, Value)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put<T: Serialize>(&mut self, key: impl Into<String>, record: &T) -> Result<(), AppError> {
        self.entries.push((key.into(), serde_json::to_value(record)?));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<(String, Value)> {
        self.entries
    }
}
