// Threshold classification for expiring inventory items.
//
// Pure functions: expiration date + current time + configured thresholds
// in, at most one classification out. Safe to call repeatedly and in any
// order across items.

use chrono::{DateTime, Utc};

use super::model::AlertType;
use crate::core::preferences::AlertPreferences;

/// Result of classifying a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub alert_type: AlertType,
    pub days_until_expiration: i64,
}

/// Whole days until `expiration`, rounded up.
///
/// An item expiring later today counts as 1; one that expired a full day
/// ago counts as -1.
pub fn days_until(expiration: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (expiration - now).num_seconds();
    secs.div_euclid(86_400) + i64::from(secs.rem_euclid(86_400) != 0)
}

/// Classify an item against the configured thresholds.
///
/// Returns `None` when the item has no expiration date or is not yet
/// within the reminder window. Ties at a threshold boundary resolve to
/// the more urgent bucket (inclusive bounds, tightest checked first).
pub fn classify(
    expiration: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    prefs: &AlertPreferences,
) -> Option<Classification> {
    let expiration = expiration?;
    let days = days_until(expiration, now);

    // Any past instant is expired, even when the rounded day count is 0.
    let alert_type = if expiration < now {
        AlertType::Expired
    } else if days <= prefs.critical_days {
        AlertType::Critical
    } else if days <= prefs.warning_days {
        AlertType::Warning
    } else if days <= prefs.reminder_days {
        AlertType::Reminder
    } else {
        return None;
    };

    Some(Classification {
        alert_type,
        days_until_expiration: days,
    })
}
