use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CollectorStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collector {
    pub id: String,
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub status: CollectorStatus,
    #[serde(default)]
    pub assigned_street: Option<String>,
    #[serde(default)]
    pub assigned_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_collections: u32,
    #[serde(default)]
    pub last_collection: Option<DateTime<Utc>>,
    pub rating: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PartnerStatus {
    Pending,
    #[serde(alias = "active")]
    Approved,
    Rejected,
}

impl PartnerStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PartnerStatus::Pending)
    }
}

/// Decision a municipality takes on a pending partnership request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnershipAction {
    Approved,
    Rejected,
}

impl PartnershipAction {
    pub fn resulting_status(&self) -> PartnerStatus {
        match self {
            PartnershipAction::Approved => PartnerStatus::Approved,
            PartnershipAction::Rejected => PartnerStatus::Rejected,
        }
    }
}

impl FromStr for PartnershipAction {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "approved" | "approve" => Ok(PartnershipAction::Approved),
            "rejected" | "reject" => Ok(PartnershipAction::Rejected),
            other => Err(AppError::InvalidArgument(format!(
                "unknown partnership action: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecyclerPartner {
    pub id: String,
    pub company_name: String,
    pub contact_person: String,
    pub phone: String,
    pub email: String,
    pub specialization: String,
    pub status: PartnerStatus,
    pub request_date: DateTime<Utc>,
    #[serde(default, alias = "approvedDate")]
    pub processed_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    #[default]
    RecyclerToMunicipality,
    MunicipalityToRecycler,
}

/// A partnership request between a recycler and the municipality. Decided
/// once, the same way as a recycler partnership.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    pub id: Uuid,
    pub requester_id: String,
    pub target_id: String,
    #[serde(default)]
    pub request_type: ConnectionType,
    pub status: PartnerStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub processed_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::{ConnectionType, PartnerStatus, PartnershipAction};

    #[test]
    fn legacy_active_status_reads_as_approved() {
        let status: PartnerStatus = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(status, PartnerStatus::Approved);
        assert!(status.is_terminal());
        assert!(!PartnerStatus::Pending.is_terminal());
    }

    #[test]
    fn actions_parse_from_dashboard_verbs() {
        assert_eq!("approve".parse::<PartnershipAction>().unwrap(), PartnershipAction::Approved);
        assert_eq!("Rejected".parse::<PartnershipAction>().unwrap(), PartnershipAction::Rejected);
        assert!("suspend".parse::<PartnershipAction>().is_err());
    }

    #[test]
    fn connection_type_defaults_to_recycler_initiated() {
        assert_eq!(ConnectionType::default(), ConnectionType::RecyclerToMunicipality);
        let parsed: ConnectionType = serde_json::from_str("\"municipality_to_recycler\"").unwrap();
        assert_eq!(parsed, ConnectionType::MunicipalityToRecycler);
    }
}
