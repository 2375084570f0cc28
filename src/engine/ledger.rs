use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::engine::alerts::{self, AlertLevel};
use crate::engine::{impact, revenue};
use crate::error::AppError;
use crate::models::bin::{Bin, Location, WasteCategory};
use crate::models::collection::{
    CollectionEvent, CollectionRequest, CollectionStatus, RecyclerDeclaration, RequestStatus,
};
use crate::models::impact::EnvironmentalMetrics;
use crate::models::payout::{Amount, PayoutEvent};
use crate::models::roster::{Collector, ConnectionRequest, RecyclerPartner};
use crate::models::session::Session;
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::observability::metrics::Metrics;
use crate::store::{KvStore, Records, WriteBatch, keys};

#[derive(Debug, Clone)]
pub struct NewBin {
    /// Generated when absent.
    pub bin_id: Option<String>,
    pub owner_id: String,
    pub location: Location,
    pub capacity_kg: f64,
}

/// Owns bin state, the collection and payout logs, and the role rosters.
///
/// All mutations are serialized through `write_gate`: every operation reads a
/// record, changes it and writes it back, and two collectors emptying the same
/// bin must not both succeed.
pub struct BinLedger {
    pub(crate) records: Records,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) write_gate: Mutex<()>,
    pub metrics: Metrics,
}

impl BinLedger {
    pub fn new(
        store: Arc<dyn KvStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        storage_timeout: Duration,
    ) -> Self {
        Self {
            records: Records::new(store, storage_timeout),
            notifier,
            clock,
            write_gate: Mutex::new(()),
            metrics: Metrics::new(),
        }
    }

    pub async fn register_bin(&self, new_bin: NewBin) -> Result<Bin, AppError> {
        if new_bin.owner_id.trim().is_empty() {
            return Err(AppError::InvalidArgument("owner id must not be empty".to_string()));
        }
        if !(new_bin.capacity_kg.is_finite() && new_bin.capacity_kg > 0.0) {
            return Err(AppError::InvalidArgument(format!(
                "capacity must be positive, got {}",
                new_bin.capacity_kg
            )));
        }

        let bin_id = match new_bin.bin_id {
            Some(id) if id.trim().is_empty() => {
                return Err(AppError::InvalidArgument("bin id must not be empty".to_string()));
            }
            Some(id) => id,
            None => generate_bin_id(),
        };

        let _guard = self.write_gate.lock().await;

        if self.records.bin(&bin_id).await?.is_some() {
            return Err(AppError::InvalidState(format!("bin {bin_id} is already registered")));
        }

        let bin = Bin::new(
            bin_id,
            new_bin.owner_id,
            new_bin.location,
            new_bin.capacity_kg,
            self.clock.now(),
        );

        let mut batch = WriteBatch::new();
        batch.put(keys::bin(&bin.bin_id), &bin)?;
        self.records.commit(batch).await?;

        info!(bin_id = %bin.bin_id, owner_id = %bin.owner_id, capacity_kg = bin.capacity_kg, "bin registered");
        Ok(bin)
    }

    /// Adds measured weight to one compartment and raises a fill alert when a
    /// threshold is crossed.
    pub async fn ingest_reading(
        &self,
        bin_id: &str,
        category: WasteCategory,
        delta_weight_kg: f64,
    ) -> Result<Bin, AppError> {
        if !delta_weight_kg.is_finite() || delta_weight_kg < 0.0 {
            return Err(AppError::InvalidArgument(format!(
                "weight delta must be a non-negative number, got {delta_weight_kg}"
            )));
        }

        let _guard = self.write_gate.lock().await;

        let mut bin = self
            .records
            .bin(bin_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("bin {bin_id}")))?;

        let previous_fill = bin.fill_level();
        bin.add_weight(category, delta_weight_kg);
        bin.last_updated = self.clock.now();
        let alert = alerts::apply(&mut bin, previous_fill);

        let mut batch = WriteBatch::new();
        batch.put(keys::bin(bin_id), &bin)?;
        self.records.commit(batch).await?;

        self.metrics
            .readings_ingested_total
            .with_label_values(&[category.as_str()])
            .inc();
        if let Some(level) = alert {
            self.raise_alert(&bin, level);
        }

        info!(
            bin_id = %bin_id,
            category = %category,
            level_pct = bin.sensors.get(category).level_pct,
            fill_pct = bin.fill_level(),
            "reading ingested"
        );

        Ok(bin)
    }

    /// Empties a bin and records what was taken. The bin reset, the event log
    /// append and the collector's counters are committed together.
    pub async fn collect_bin(
        &self,
        bin_id: &str,
        collector_id: &str,
    ) -> Result<CollectionEvent, AppError> {
        let result = self.collect_bin_inner(bin_id, collector_id).await;

        let outcome = if result.is_ok() { "success" } else { "error" };
        self.metrics
            .collections_total
            .with_label_values(&[outcome])
            .inc();

        result
    }

    async fn collect_bin_inner(
        &self,
        bin_id: &str,
        collector_id: &str,
    ) -> Result<CollectionEvent, AppError> {
        if collector_id.trim().is_empty() {
            return Err(AppError::InvalidArgument("collector id must not be empty".to_string()));
        }

        let _guard = self.write_gate.lock().await;

        let mut bin = self
            .records
            .bin(bin_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("bin {bin_id}")))?;

        let now = self.clock.now();
        let mut collectors = self.records.collectors().await?;

        let collector = collectors
            .as_mut()
            .and_then(|roster| roster.iter_mut().find(|c| c.id == collector_id));
        let collector_name = collector.map(|c| {
            c.total_collections = c.total_collections.saturating_add(1);
            c.last_collection = Some(now);
            c.name.clone()
        });

        if collector_name.is_none() {
            warn!(collector_id = %collector_id, "collector not on roster");
        }

        let event = CollectionEvent::snapshot(&bin, collector_id, collector_name, now);

        bin.reset_sensors();
        bin.last_updated = now;

        let mut events = self.records.collection_events().await?;
        events.push(event.clone());

        let mut batch = WriteBatch::new();
        batch.put(keys::bin(bin_id), &bin)?;
        batch.put(keys::COLLECTION_EVENTS, &events)?;
        if let Some(roster) = &collectors {
            batch.put(keys::COLLECTORS, roster)?;
        }
        self.records.commit(batch).await?;

        info!(
            event_id = %event.id,
            bin_id = %bin_id,
            collector_id = %collector_id,
            total_weight_kg = event.total_weight,
            "bin collected"
        );

        Ok(event)
    }

    /// Sells a collected load to a recycler and distributes the revenue.
    /// A load can be sold once; a second bid on the same event is rejected.
    pub async fn accept_recycler_bid(
        &self,
        event_id: Uuid,
        recycler_id: &str,
        bid_amount: f64,
    ) -> Result<PayoutEvent, AppError> {
        self.accept_recycler_bid_with_weights(
            event_id,
            recycler_id,
            bid_amount,
            RecyclerDeclaration::default(),
        )
        .await
    }

    /// Same as [`BinLedger::accept_recycler_bid`], also recording the weights
    /// the recycler declares for the load.
    pub async fn accept_recycler_bid_with_weights(
        &self,
        event_id: Uuid,
        recycler_id: &str,
        bid_amount: f64,
        declaration: RecyclerDeclaration,
    ) -> Result<PayoutEvent, AppError> {
        let bid = Amount::from_major(bid_amount)?;
        if recycler_id.trim().is_empty() {
            return Err(AppError::InvalidArgument("recycler id must not be empty".to_string()));
        }
        declaration.validate()?;

        let _guard = self.write_gate.lock().await;

        let mut events = self.records.collection_events().await?;
        let event = events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| AppError::NotFound(format!("collection event {event_id}")))?;

        if event.status != CollectionStatus::Collected {
            return Err(AppError::InvalidState(format!(
                "collection event {event_id} was already sold to {}",
                event.recycler_id.as_deref().unwrap_or("a recycler")
            )));
        }

        let now = self.clock.now();
        event.status = CollectionStatus::Recycled;
        event.recycler_id = Some(recycler_id.to_string());
        event.recycler_bid = Some(bid);
        event.recycler_collection_timestamp = Some(now);
        event.recycler_compost_weight = declaration.compost_weight_kg;
        event.recycler_others_weight = declaration.others_weight_kg;

        let shares = revenue::split(bid);
        let payout = PayoutEvent {
            id: Uuid::new_v4(),
            collection_event_id: event.id,
            bin_id: event.bin_id.clone(),
            total_revenue: shares.total,
            user_share: shares.user_share,
            municipality_share: shares.municipality_share,
            timestamp: now,
        };

        let mut payouts = self.records.payout_events().await?;
        payouts.push(payout.clone());

        let mut batch = WriteBatch::new();
        batch.put(keys::COLLECTION_EVENTS, &events)?;
        batch.put(keys::PAYOUT_EVENTS, &payouts)?;
        self.records.commit(batch).await?;

        self.metrics.payouts_total.inc();
        self.metrics
            .revenue_minor_units_total
            .with_label_values(&["user"])
            .inc_by(payout.user_share.minor());
        self.metrics
            .revenue_minor_units_total
            .with_label_values(&["municipality"])
            .inc_by(payout.municipality_share.minor());

        self.notifier.notify(Notification {
            kind: NotificationKind::RevenueProcessed,
            title: "Revenue Processed".to_string(),
            body: format!("User earned ₹{} from waste collection.", payout.user_share),
            bin_id: Some(payout.bin_id.clone()),
            sent_at: now,
        });

        info!(
            event_id = %event_id,
            recycler_id = %recycler_id,
            bid = %bid,
            user_share = %payout.user_share,
            municipality_share = %payout.municipality_share,
            "recycler bid accepted"
        );

        Ok(payout)
    }

    pub async fn request_collection(
        &self,
        bin_id: &str,
        user_id: &str,
    ) -> Result<CollectionRequest, AppError> {
        let _guard = self.write_gate.lock().await;

        if self.records.bin(bin_id).await?.is_none() {
            return Err(AppError::NotFound(format!("bin {bin_id}")));
        }

        let request = CollectionRequest {
            id: Uuid::new_v4(),
            bin_id: bin_id.to_string(),
            user_id: user_id.to_string(),
            status: RequestStatus::Pending,
            timestamp: self.clock.now(),
        };

        let mut requests = self.records.collection_requests().await?;
        requests.push(request.clone());

        let mut batch = WriteBatch::new();
        batch.put(keys::COLLECTION_REQUESTS, &requests)?;
        self.records.commit(batch).await?;

        self.notifier.notify(Notification {
            kind: NotificationKind::CollectionRequested,
            title: "Collection Requested".to_string(),
            body: "Your collection request has been sent.".to_string(),
            bin_id: Some(bin_id.to_string()),
            sent_at: request.timestamp,
        });

        info!(request_id = %request.id, bin_id = %bin_id, user_id = %user_id, "collection requested");
        Ok(request)
    }

    /// Totals the CO2 avoided by every collection so far and appends the
    /// snapshot to the metrics log.
    pub async fn calculate_environmental_impact(&self) -> Result<EnvironmentalMetrics, AppError> {
        let _guard = self.write_gate.lock().await;

        let events = self.records.collection_events().await?;
        let (total_co2_saved_kg, category_impacts) = impact::co2_saved(&events);

        let snapshot = EnvironmentalMetrics {
            id: Uuid::new_v4(),
            total_co2_saved_kg,
            category_impacts,
            timestamp: self.clock.now(),
        };

        let mut history = self.records.environmental_metrics().await?;
        history.push(snapshot.clone());

        let mut batch = WriteBatch::new();
        batch.put(keys::ENVIRONMENTAL_METRICS, &history)?;
        self.records.commit(batch).await?;

        info!(total_co2_saved_kg, events = events.len(), "environmental impact calculated");
        Ok(snapshot)
    }

    pub(crate) fn raise_alert(&self, bin: &Bin, level: AlertLevel) {
        let kind = match level {
            AlertLevel::Warning => NotificationKind::WarningLevel,
            AlertLevel::Critical => NotificationKind::CriticalLevel,
        };

        self.metrics
            .alerts_total
            .with_label_values(&[level.as_str()])
            .inc();

        warn!(bin_id = %bin.bin_id, level = level.as_str(), fill_pct = bin.fill_level(), "fill alert");

        self.notifier.notify(Notification {
            kind,
            title: alerts::title(level).to_string(),
            body: alerts::message(level, &bin.bin_id),
            bin_id: Some(bin.bin_id.clone()),
            sent_at: bin.last_updated,
        });
    }

    pub async fn bin(&self, bin_id: &str) -> Result<Option<Bin>, AppError> {
        self.records.bin(bin_id).await
    }

    pub async fn bins(&self) -> Result<Vec<Bin>, AppError> {
        self.records.bins().await
    }

    pub async fn bins_by_user(&self, user_id: &str) -> Result<Vec<Bin>, AppError> {
        Ok(self
            .records
            .bins()
            .await?
            .into_iter()
            .filter(|bin| bin.owner_id == user_id)
            .collect())
    }

    pub async fn collection_events(&self) -> Result<Vec<CollectionEvent>, AppError> {
        self.records.collection_events().await
    }

    pub async fn collection_events_by_bin(
        &self,
        bin_id: &str,
    ) -> Result<Vec<CollectionEvent>, AppError> {
        Ok(self
            .records
            .collection_events()
            .await?
            .into_iter()
            .filter(|event| event.bin_id == bin_id)
            .collect())
    }

    pub async fn payout_events(&self) -> Result<Vec<PayoutEvent>, AppError> {
        self.records.payout_events().await
    }

    pub async fn payout_events_by_bin(&self, bin_id: &str) -> Result<Vec<PayoutEvent>, AppError> {
        Ok(self
            .records
            .payout_events()
            .await?
            .into_iter()
            .filter(|payout| payout.bin_id == bin_id)
            .collect())
    }

    pub async fn collection_requests(&self) -> Result<Vec<CollectionRequest>, AppError> {
        self.records.collection_requests().await
    }

    pub async fn collectors(&self) -> Result<Vec<Collector>, AppError> {
        Ok(self.records.collectors().await?.unwrap_or_default())
    }

    pub async fn recycler_partners(&self) -> Result<Vec<RecyclerPartner>, AppError> {
        Ok(self.records.recycler_partners().await?.unwrap_or_default())
    }

    pub async fn connection_requests(&self) -> Result<Vec<ConnectionRequest>, AppError> {
        self.records.connection_requests().await
    }

    pub async fn current_session(&self) -> Result<Option<Session>, AppError> {
        self.records.current_session().await
    }
}

fn generate_bin_id() -> String {
    let raw = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("BIN-{}", &raw[..12])
}
