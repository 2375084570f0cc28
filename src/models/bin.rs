use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Relative tolerance used when checking `weight == level * capacity` on
/// persisted records. Scaled by the compartment capacity.
const RECONCILE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteCategory {
    Organic,
    Plastic,
    Hazardous,
    Others,
}

impl WasteCategory {
    pub const ALL: [WasteCategory; 4] = [
        WasteCategory::Organic,
        WasteCategory::Plastic,
        WasteCategory::Hazardous,
        WasteCategory::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WasteCategory::Organic => "organic",
            WasteCategory::Plastic => "plastic",
            WasteCategory::Hazardous => "hazardous",
            WasteCategory::Others => "others",
        }
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WasteCategory {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "organic" => Ok(WasteCategory::Organic),
            "plastic" => Ok(WasteCategory::Plastic),
            "hazardous" => Ok(WasteCategory::Hazardous),
            "others" => Ok(WasteCategory::Others),
            other => Err(AppError::InvalidArgument(format!(
                "unknown waste category: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub level_pct: f64,
    pub weight_kg: f64,
}

/// One value per waste category. The category set is closed, so this is a
/// struct rather than a map.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryMap<T> {
    pub organic: T,
    pub plastic: T,
    pub hazardous: T,
    pub others: T,
}

impl<T> CategoryMap<T> {
    pub fn get(&self, category: WasteCategory) -> &T {
        match category {
            WasteCategory::Organic => &self.organic,
            WasteCategory::Plastic => &self.plastic,
            WasteCategory::Hazardous => &self.hazardous,
            WasteCategory::Others => &self.others,
        }
    }

    pub fn get_mut(&mut self, category: WasteCategory) -> &mut T {
        match category {
            WasteCategory::Organic => &mut self.organic,
            WasteCategory::Plastic => &mut self.plastic,
            WasteCategory::Hazardous => &mut self.hazardous,
            WasteCategory::Others => &mut self.others,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (WasteCategory, &T)> {
        WasteCategory::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }
}

pub type SensorMap = CategoryMap<SensorReading>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub street: String,
    pub city: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerStatus {
    #[serde(alias = "lastReadWattHour")]
    pub cumulative_watt_hour: f64,
    pub battery_pct: f64,
}

impl Default for PowerStatus {
    fn default() -> Self {
        Self {
            cumulative_watt_hour: 0.0,
            battery_pct: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bin {
    pub bin_id: String,
    #[serde(alias = "userBinOwner")]
    pub owner_id: String,
    pub location: Location,
    #[serde(alias = "binCapacityKg")]
    pub capacity_kg: f64,
    pub sensors: SensorMap,
    #[serde(default)]
    pub power: PowerStatus,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub notified: bool,
    /// Raised by a segregation complaint, cleared when the complaint is resolved.
    #[serde(default, alias = "isSegregationError")]
    pub segregation_error: bool,
}

impl Bin {
    pub fn new(
        bin_id: String,
        owner_id: String,
        location: Location,
        capacity_kg: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            bin_id,
            owner_id,
            location,
            capacity_kg,
            sensors: SensorMap::default(),
            power: PowerStatus::default(),
            last_updated: now,
            notified: false,
            segregation_error: false,
        }
    }

    /// Each category compartment holds a quarter of the bin.
    pub fn compartment_capacity_kg(&self) -> f64 {
        self.capacity_kg / 4.0
    }

    /// Mean of the four category levels.
    pub fn fill_level(&self) -> f64 {
        self.sensors.iter().map(|(_, s)| s.level_pct).sum::<f64>() / 4.0
    }

    pub fn total_weight_kg(&self) -> f64 {
        self.sensors.iter().map(|(_, s)| s.weight_kg).sum()
    }

    /// Adds weight to one compartment, clamped at the compartment capacity,
    /// and re-derives the level from the new weight.
    pub fn add_weight(&mut self, category: WasteCategory, delta_kg: f64) {
        let capacity = self.compartment_capacity_kg();
        let sensor = self.sensors.get_mut(category);

        sensor.weight_kg = (sensor.weight_kg + delta_kg.max(0.0)).min(capacity);
        sensor.level_pct = if capacity > 0.0 {
            (sensor.weight_kg * 100.0 / capacity).clamp(0.0, 100.0)
        } else {
            0.0
        };
    }

    /// Raises one compartment by percentage points and re-derives its weight.
    /// A full compartment is left untouched.
    pub fn add_level(&mut self, category: WasteCategory, delta_pct: f64) -> bool {
        let capacity = self.compartment_capacity_kg();
        let sensor = self.sensors.get_mut(category);

        if sensor.level_pct >= 100.0 || delta_pct <= 0.0 {
            return false;
        }

        sensor.level_pct = (sensor.level_pct + delta_pct).min(100.0);
        sensor.weight_kg = sensor.level_pct * capacity / 100.0;
        true
    }

    pub fn reset_sensors(&mut self) {
        self.sensors = SensorMap::default();
        self.notified = false;
    }

    /// Checks the at-rest invariants of a record read from storage.
    pub fn validate(&self) -> Result<(), AppError> {
        let malformed =
            |reason: String| AppError::StorageFailure(format!("bin {}: {reason}", self.bin_id));

        if !(self.capacity_kg.is_finite() && self.capacity_kg > 0.0) {
            return Err(malformed(format!("invalid capacity {}", self.capacity_kg)));
        }

        let capacity = self.compartment_capacity_kg();
        let tolerance = RECONCILE_EPSILON * capacity.max(1.0);
        for (category, sensor) in self.sensors.iter() {
            if !(0.0..=100.0).contains(&sensor.level_pct) {
                return Err(malformed(format!(
                    "{category} level {} out of range",
                    sensor.level_pct
                )));
            }
            if !(0.0..=capacity + tolerance).contains(&sensor.weight_kg) {
                return Err(malformed(format!(
                    "{category} weight {} out of range",
                    sensor.weight_kg
                )));
            }
            let expected = sensor.level_pct / 100.0 * capacity;
            if (expected - sensor.weight_kg).abs() > tolerance {
                return Err(malformed(format!(
                    "{category} weight {} does not match level {}",
                    sensor.weight_kg, sensor.level_pct
                )));
            }
        }

        if !(0.0..=100.0).contains(&self.power.battery_pct) {
            return Err(malformed(format!(
                "battery {} out of range",
                self.power.battery_pct
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Bin, Location, WasteCategory};

    fn bin(capacity_kg: f64) -> Bin {
        Bin::new(
            "BIN-T".to_string(),
            "user_1".to_string(),
            Location {
                latitude: 13.08,
                longitude: 80.27,
                street: "123 Green Street".to_string(),
                city: "Chennai".to_string(),
            },
            capacity_kg,
            Utc::now(),
        )
    }

    fn assert_reconciled(bin: &Bin) {
        for (_, sensor) in bin.sensors.iter() {
            let expected = sensor.level_pct / 100.0 * bin.compartment_capacity_kg();
            assert!((expected - sensor.weight_kg).abs() < 1e-9);
        }
    }

    #[test]
    fn weight_derives_level_against_compartment_capacity() {
        let mut bin = bin(30.0);
        bin.add_weight(WasteCategory::Organic, 3.375);

        assert_eq!(bin.sensors.organic.level_pct, 45.0);
        assert_eq!(bin.sensors.organic.weight_kg, 3.375);
        assert_reconciled(&bin);
    }

    #[test]
    fn oversized_weight_clamps_to_compartment() {
        let mut bin = bin(30.0);
        bin.add_weight(WasteCategory::Plastic, 1_000.0);

        assert_eq!(bin.sensors.plastic.weight_kg, 7.5);
        assert_eq!(bin.sensors.plastic.level_pct, 100.0);
        assert_reconciled(&bin);
    }

    #[test]
    fn level_increment_stops_at_full() {
        let mut bin = bin(30.0);
        assert!(bin.add_level(WasteCategory::Hazardous, 97.0));
        assert!(bin.add_level(WasteCategory::Hazardous, 6.0));
        assert_eq!(bin.sensors.hazardous.level_pct, 100.0);
        assert!(!bin.add_level(WasteCategory::Hazardous, 1.0));
        assert_reconciled(&bin);
    }

    #[test]
    fn fill_level_is_mean_of_categories() {
        let mut bin = bin(40.0);
        bin.add_level(WasteCategory::Organic, 100.0);
        bin.add_level(WasteCategory::Others, 60.0);

        assert_eq!(bin.fill_level(), 40.0);
    }

    #[test]
    fn category_names_parse_case_insensitively() {
        assert_eq!("Organic".parse::<WasteCategory>().unwrap(), WasteCategory::Organic);
        assert_eq!(" PLASTIC ".parse::<WasteCategory>().unwrap(), WasteCategory::Plastic);
        assert!("glass".parse::<WasteCategory>().is_err());
    }

    #[test]
    fn validate_rejects_diverged_weight() {
        let mut bin = bin(30.0);
        bin.sensors.organic.level_pct = 50.0;
        bin.sensors.organic.weight_kg = 1.0;

        assert!(bin.validate().is_err());
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let raw = serde_json::json!({
            "binId": "BIN-1",
            "userBinOwner": "user_1",
            "location": { "latitude": 13.0, "longitude": 80.0, "street": "Main", "city": "Chennai" },
            "binCapacityKg": 30,
            "sensors": {
                "organic": { "levelPct": 0, "weightKg": 0 },
                "plastic": { "levelPct": 0, "weightKg": 0 },
                "hazardous": { "levelPct": 0, "weightKg": 0 },
                "others": { "levelPct": 0, "weightKg": 0 }
            },
            "power": { "lastReadWattHour": 1.5, "batteryPct": 99 },
            "lastUpdated": "2025-01-01T00:00:00Z",
            "isSegregationError": true
        });

        let bin: Bin = serde_json::from_value(raw).unwrap();
        assert_eq!(bin.owner_id, "user_1");
        assert_eq!(bin.capacity_kg, 30.0);
        assert_eq!(bin.power.cumulative_watt_hour, 1.5);
        assert!(!bin.notified);
        assert!(bin.segregation_error);
        assert!(bin.validate().is_ok());
    }

    #[test]
    fn very_large_bins_still_reconcile() {
        let mut bin = bin(4e12);
        bin.add_weight(WasteCategory::Organic, 4e12 / 12.0);
        bin.add_level(WasteCategory::Plastic, 33.3);

        assert!(bin.validate().is_ok());
    }

    #[test]
    fn small_bins_keep_a_tight_tolerance() {
        let mut bin = bin(0.4);
        bin.add_level(WasteCategory::Organic, 50.0);
        bin.sensors.organic.weight_kg += 1e-5;

        assert!(bin.validate().is_err());
    }
}
