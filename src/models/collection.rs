use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::bin::{Bin, Location, SensorMap};
use crate::models::payout::Amount;

pub const UNKNOWN_COLLECTOR: &str = "Unknown Collector";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    Collected,
    Recycled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEvent {
    pub id: Uuid,
    pub bin_id: String,
    pub collector_id: String,
    pub collector_name: String,
    pub location: Location,
    pub timestamp: DateTime<Utc>,
    pub waste_collected: SensorMap,
    pub organic_weight: f64,
    pub plastic_weight: f64,
    pub hazardous_weight: f64,
    pub others_weight: f64,
    pub total_weight: f64,
    pub status: CollectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycler_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycler_bid: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycler_collection_timestamp: Option<DateTime<Utc>>,
    /// Weights the recycler reports after sorting the load. They sit beside
    /// the bin's measured weights and never replace them.
    #[serde(default, alias = "compostWeight", skip_serializing_if = "Option::is_none")]
    pub recycler_compost_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycler_others_weight: Option<f64>,
}

impl CollectionEvent {
    /// Captures the bin's current contents. The bin itself is not modified.
    pub fn snapshot(
        bin: &Bin,
        collector_id: &str,
        collector_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let sensors = bin.sensors;

        Self {
            id: Uuid::new_v4(),
            bin_id: bin.bin_id.clone(),
            collector_id: collector_id.to_string(),
            collector_name: collector_name.unwrap_or_else(|| UNKNOWN_COLLECTOR.to_string()),
            location: bin.location.clone(),
            timestamp: now,
            waste_collected: sensors,
            organic_weight: sensors.organic.weight_kg,
            plastic_weight: sensors.plastic.weight_kg,
            hazardous_weight: sensors.hazardous.weight_kg,
            others_weight: sensors.others.weight_kg,
            total_weight: bin.total_weight_kg(),
            status: CollectionStatus::Collected,
            recycler_id: None,
            recycler_bid: None,
            recycler_collection_timestamp: None,
            recycler_compost_weight: None,
            recycler_others_weight: None,
        }
    }
}

/// Optional weights a recycler declares when buying a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecyclerDeclaration {
    pub compost_weight_kg: Option<f64>,
    pub others_weight_kg: Option<f64>,
}

impl RecyclerDeclaration {
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, weight) in [
            ("compost", self.compost_weight_kg),
            ("others", self.others_weight_kg),
        ] {
            if let Some(kg) = weight.filter(|kg| !kg.is_finite() || *kg < 0.0) {
                return Err(AppError::InvalidArgument(format!(
                    "declared {name} weight must be a non-negative number, got {kg}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
}

/// A household asking for its bin to be emptied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRequest {
    pub id: Uuid,
    pub bin_id: String,
    pub user_id: String,
    pub status: RequestStatus,
    pub timestamp: DateTime<Utc>,
}
