use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Money in integer minor units (paise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Converts a rupee amount. Amounts that are not a whole number of paise
    /// are rejected rather than rounded, so the stored total always equals
    /// what the caller passed.
    pub fn from_major(major: f64) -> Result<Self, AppError> {
        if !major.is_finite() || major < 0.0 {
            return Err(AppError::InvalidArgument(format!(
                "amount must be a non-negative number, got {major}"
            )));
        }

        let scaled = major * 100.0;
        let minor = scaled.round();
        if minor > u64::MAX as f64 {
            return Err(AppError::InvalidArgument(format!("amount {major} is too large")));
        }

        // Absorbs binary representation error only, e.g. 123.47 * 100.
        let tolerance = (4.0 * f64::EPSILON * scaled).max(1e-9);
        if (scaled - minor).abs() > tolerance {
            return Err(AppError::InvalidArgument(format!(
                "amount {major} is not a whole number of paise"
            )));
        }

        Ok(Self(minor as u64))
    }

    pub fn minor(&self) -> u64 {
        self.0
    }

    pub fn as_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutEvent {
    pub id: Uuid,
    pub collection_event_id: Uuid,
    pub bin_id: String,
    pub total_revenue: Amount,
    pub user_share: Amount,
    pub municipality_share: Amount,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::Amount;

    #[test]
    fn major_amounts_convert_to_paise() {
        assert_eq!(Amount::from_major(100.0).unwrap().minor(), 10_000);
        assert_eq!(Amount::from_major(0.13).unwrap().minor(), 13);
        assert_eq!(Amount::from_major(123.47).unwrap().minor(), 12_347);
        assert_eq!(Amount::from_major(999_999.99).unwrap().minor(), 99_999_999);
        assert_eq!(Amount::from_major(0.0).unwrap(), Amount::ZERO);
    }

    #[test]
    fn fractional_paise_are_rejected() {
        assert!(Amount::from_major(0.125).is_err());
        assert!(Amount::from_major(0.005).is_err());
        assert!(Amount::from_major(1_000_000.005).is_err());
    }

    #[test]
    fn negative_and_non_finite_amounts_are_rejected() {
        assert!(Amount::from_major(-0.01).is_err());
        assert!(Amount::from_major(f64::NAN).is_err());
        assert!(Amount::from_major(f64::INFINITY).is_err());
    }

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Amount::from_minor(4_005).to_string(), "40.05");
        assert_eq!(Amount::from_minor(7).to_string(), "0.07");
    }
}
