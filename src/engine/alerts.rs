use serde::{Deserialize, Serialize};

use crate::models::bin::Bin;

pub const WARNING_FILL_PCT: f64 = 75.0;
pub const CRITICAL_FILL_PCT: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
        }
    }
}

/// Two-tier fill alert.
///
/// Critical fires whenever the fill level is at or above 90% and the bin has
/// not been flagged yet; the caller sets `notified` so it never repeats until
/// the next collection. Warning fires only on the transition into [75, 90)
/// and leaves `notified` alone.
pub fn evaluate(previous_fill: f64, current_fill: f64, notified: bool) -> Option<AlertLevel> {
    if notified {
        return None;
    }

    if current_fill >= CRITICAL_FILL_PCT {
        return Some(AlertLevel::Critical);
    }

    if current_fill >= WARNING_FILL_PCT && previous_fill < WARNING_FILL_PCT {
        return Some(AlertLevel::Warning);
    }

    None
}

/// Applies [`evaluate`] to a bin whose sensors were just updated and latches
/// `notified` on a critical alert.
pub fn apply(bin: &mut Bin, previous_fill: f64) -> Option<AlertLevel> {
    let level = evaluate(previous_fill, bin.fill_level(), bin.notified)?;
    if level == AlertLevel::Critical {
        bin.notified = true;
    }
    Some(level)
}

pub fn title(level: AlertLevel) -> &'static str {
    match level {
        AlertLevel::Warning => "Bin Level Warning",
        AlertLevel::Critical => "Critical Bin Level",
    }
}

pub fn message(level: AlertLevel, bin_id: &str) -> String {
    match level {
        AlertLevel::Warning => {
            format!("Bin {bin_id} is 75% full and should be collected soon.")
        }
        AlertLevel::Critical => {
            format!("Bin {bin_id} is 90% full and needs immediate collection!")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AlertLevel, evaluate};

    #[test]
    fn critical_fires_at_ninety_when_not_notified() {
        assert_eq!(evaluate(80.0, 90.0, false), Some(AlertLevel::Critical));
        assert_eq!(evaluate(10.0, 100.0, false), Some(AlertLevel::Critical));
    }

    #[test]
    fn notified_bins_stay_silent() {
        assert_eq!(evaluate(90.0, 95.0, true), None);
        assert_eq!(evaluate(70.0, 80.0, true), None);
    }

    #[test]
    fn warning_fires_only_on_crossing() {
        assert_eq!(evaluate(74.9, 75.0, false), Some(AlertLevel::Warning));
        assert_eq!(evaluate(76.0, 80.0, false), None);
    }

    #[test]
    fn below_warning_is_quiet() {
        assert_eq!(evaluate(10.0, 74.99, false), None);
    }
}
