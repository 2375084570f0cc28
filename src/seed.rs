//! First-run roster data.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::engine::ledger::BinLedger;
use crate::error::AppError;
use crate::models::roster::{Collector, CollectorStatus, PartnerStatus, RecyclerPartner};
use crate::store::{WriteBatch, keys};

pub fn default_collectors() -> Vec<Collector> {
    [
        ("collector_1", "Sudhakar", "+91 9876543210", "sudhakar@waste.com", 4.8),
        ("collector_2", "Gomathi", "+91 9876543211", "gomathi@waste.com", 4.6),
        ("collector_3", "Rajesh", "+91 9876543212", "rajesh@waste.com", 4.9),
        ("collector_4", "Kavitha", "+91 9876543213", "kavitha@waste.com", 4.7),
    ]
    .into_iter()
    .map(|(id, name, mobile, email, rating)| Collector {
        id: id.to_string(),
        name: name.to_string(),
        mobile: mobile.to_string(),
        email: email.to_string(),
        status: CollectorStatus::Active,
        assigned_street: None,
        assigned_date: None,
        total_collections: 0,
        last_collection: None,
        rating,
    })
    .collect()
}

pub fn default_recycler_partners(now: DateTime<Utc>) -> Vec<RecyclerPartner> {
    vec![
        RecyclerPartner {
            id: "recycler_1".to_string(),
            company_name: "GreenCycle Industries".to_string(),
            contact_person: "Raj Kumar".to_string(),
            phone: "+91 9876543220".to_string(),
            email: "raj@greencycle.com".to_string(),
            specialization: "Plastic & Electronic Waste".to_string(),
            status: PartnerStatus::Approved,
            request_date: now,
            processed_date: Some(now),
        },
        RecyclerPartner {
            id: "recycler_2".to_string(),
            company_name: "EcoWaste Solutions".to_string(),
            contact_person: "Priya Sharma".to_string(),
            phone: "+91 9876543221".to_string(),
            email: "priya@ecowaste.com".to_string(),
            specialization: "Organic & Compost".to_string(),
            status: PartnerStatus::Pending,
            request_date: now,
            processed_date: None,
        },
    ]
}

impl BinLedger {
    /// Writes the default rosters for whichever of them is missing. Existing
    /// rosters are never overwritten.
    pub async fn seed_defaults(&self) -> Result<(), AppError> {
        let _guard = self.write_gate.lock().await;

        let mut batch = WriteBatch::new();

        if self.records.collectors().await?.is_none() {
            batch.put(keys::COLLECTORS, &default_collectors())?;
        }
        if self.records.recycler_partners().await?.is_none() {
            batch.put(
                keys::RECYCLER_PARTNERS,
                &default_recycler_partners(self.clock.now()),
            )?;
        }

        let seeded = batch.len();
        self.records.commit(batch).await?;

        if seeded > 0 {
            info!(rosters = seeded, "default rosters seeded");
        }
        Ok(())
    }
}
