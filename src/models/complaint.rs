use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintStatus {
    Pending,
    Warned,
    Resolved,
}

impl ComplaintStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ComplaintStatus::Pending)
    }
}

/// What the municipality does about a reported segregation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintAction {
    /// The household is warned and the bin stays flagged.
    Warning,
    Resolve,
}

impl ComplaintAction {
    pub fn resulting_status(&self) -> ComplaintStatus {
        match self {
            ComplaintAction::Warning => ComplaintStatus::Warned,
            ComplaintAction::Resolve => ComplaintStatus::Resolved,
        }
    }
}

impl FromStr for ComplaintAction {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "warning" | "warn" => Ok(ComplaintAction::Warning),
            "resolve" | "resolved" => Ok(ComplaintAction::Resolve),
            other => Err(AppError::InvalidArgument(format!(
                "unknown complaint action: {other}"
            ))),
        }
    }
}

/// A report that a household mixed waste categories in its bin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegregationComplaint {
    pub id: Uuid,
    pub bin_id: String,
    pub reported_by: String,
    pub description: String,
    pub status: ComplaintStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ComplaintAction>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub processed_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::{ComplaintAction, ComplaintStatus};

    #[test]
    fn actions_map_to_closing_statuses() {
        assert_eq!(ComplaintAction::Warning.resulting_status(), ComplaintStatus::Warned);
        assert_eq!(ComplaintAction::Resolve.resulting_status(), ComplaintStatus::Resolved);
        assert!(ComplaintStatus::Warned.is_terminal());
        assert!(!ComplaintStatus::Pending.is_terminal());
    }

    #[test]
    fn actions_parse_from_dashboard_verbs() {
        assert_eq!("warning".parse::<ComplaintAction>().unwrap(), ComplaintAction::Warning);
        assert_eq!(" Resolve ".parse::<ComplaintAction>().unwrap(), ComplaintAction::Resolve);
        assert!("ignore".parse::<ComplaintAction>().is_err());
    }
}
