use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    CriticalLevel,
    WarningLevel,
    RevenueProcessed,
    CollectionRequested,
    ConnectionRequested,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub bin_id: Option<String>,
    pub sent_at: DateTime<Utc>,
}

/// One-way alert channel. Delivery is best effort and never reported back.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(buffer_size: usize) -> (Self, broadcast::Receiver<Notification>) {
        let (tx, rx) = broadcast::channel(buffer_size.max(1));
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        // No subscribers is not an error for a fire-and-forget channel.
        let _ = self.tx.send(notification);
    }
}
