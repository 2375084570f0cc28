use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::engine::ledger::BinLedger;
use crate::error::AppError;
use crate::notify::{BroadcastNotifier, Notification};
use crate::store::{FileStore, KvStore, MemoryStore};

/// Everything the process shares, built once at startup and passed around by
/// reference.
pub struct AppState {
    pub ledger: Arc<BinLedger>,
    pub notifier: Arc<BroadcastNotifier>,
}

impl AppState {
    pub fn new(
        config: &Config,
        store: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
    ) -> (Self, broadcast::Receiver<Notification>) {
        let (notifier, notification_rx) = BroadcastNotifier::new(config.notification_buffer_size);
        let notifier = Arc::new(notifier);

        let ledger = BinLedger::new(store, notifier.clone(), clock, config.storage_timeout);

        (
            Self {
                ledger: Arc::new(ledger),
                notifier,
            },
            notification_rx,
        )
    }

    /// Opens the configured store and builds the state on the system clock.
    pub async fn open(config: &Config) -> Result<(Self, broadcast::Receiver<Notification>), AppError> {
        let store: Arc<dyn KvStore> = match &config.data_path {
            Some(path) => Arc::new(FileStore::open(path).await?),
            None => {
                info!("no DATA_PATH set; records are kept in memory");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::new(config, store, Arc::new(SystemClock)))
    }
}
