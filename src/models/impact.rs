use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::bin::CategoryMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalMetrics {
    pub id: Uuid,
    pub total_co2_saved_kg: f64,
    pub category_impacts: CategoryMap<f64>,
    pub timestamp: DateTime<Utc>,
}
