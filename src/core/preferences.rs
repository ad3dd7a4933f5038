//! User-configurable alert preferences.
//!
//! A single record per household scope: day thresholds, the daily alert
//! cap, default snooze duration and the quiet-hours window. Loaded through
//! the storage port with defaults on first run; partial updates merge onto
//! the current record and are validated before they take effect.

use chrono::NaiveTime;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::error::AlertError;
use crate::core::storage::StoragePort;

const STORAGE_KEY: &str = "alert_preferences";

/// Window of the day during which notifications are withheld.
///
/// Bounds are "HH:mm" strings; the window may wrap past midnight
/// (e.g. 22:00-07:00).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub enabled: bool,
    pub start: String,
    pub end: String,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: false,
            start: "22:00".to_string(),
            end: "07:00".to_string(),
        }
    }
}

impl QuietHours {
    fn parse_bound(value: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(value, "%H:%M").ok()
    }

    /// Whether `time` falls inside the window. A disabled or unparseable
    /// window contains nothing.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if !self.enabled {
            return false;
        }
        let (Some(start), Some(end)) = (Self::parse_bound(&self.start), Self::parse_bound(&self.end))
        else {
            return false;
        };
        if start <= end {
            time >= start && time < end
        } else {
            // Window wraps midnight
            time >= start || time < end
        }
    }
}

/// Alert preference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPreferences {
    pub enabled: bool,
    pub reminder_days: i64,
    pub warning_days: i64,
    pub critical_days: i64,
    pub max_alerts_per_day: u32,
    pub snooze_default_hours: u32,
    pub quiet_hours: QuietHours,
}

impl Default for AlertPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            reminder_days: 7,
            warning_days: 3,
            critical_days: 1,
            max_alerts_per_day: 10,
            snooze_default_hours: 24,
            quiet_hours: QuietHours::default(),
        }
    }
}

impl AlertPreferences {
    /// Check threshold ordering and value ranges.
    pub fn validate(&self) -> Result<(), AlertError> {
        if self.critical_days < 0 {
            return Err(AlertError::Validation {
                field: "critical_days",
                reason: "must be zero or more days".to_string(),
            });
        }
        if self.warning_days < self.critical_days {
            return Err(AlertError::Validation {
                field: "warning_days",
                reason: format!("must be at least critical_days ({})", self.critical_days),
            });
        }
        if self.reminder_days < self.warning_days {
            return Err(AlertError::Validation {
                field: "reminder_days",
                reason: format!("must be at least warning_days ({})", self.warning_days),
            });
        }
        if self.max_alerts_per_day == 0 {
            return Err(AlertError::Validation {
                field: "max_alerts_per_day",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.snooze_default_hours == 0 {
            return Err(AlertError::Validation {
                field: "snooze_default_hours",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.quiet_hours.enabled {
            if QuietHours::parse_bound(&self.quiet_hours.start).is_none() {
                return Err(AlertError::Validation {
                    field: "quiet_hours.start",
                    reason: format!("not a HH:mm time: {}", self.quiet_hours.start),
                });
            }
            if QuietHours::parse_bound(&self.quiet_hours.end).is_none() {
                return Err(AlertError::Validation {
                    field: "quiet_hours.end",
                    reason: format!("not a HH:mm time: {}", self.quiet_hours.end),
                });
            }
        }
        Ok(())
    }

    fn merged(&self, patch: &PreferencesPatch) -> Self {
        let mut next = self.clone();
        if let Some(enabled) = patch.enabled {
            next.enabled = enabled;
        }
        if let Some(days) = patch.reminder_days {
            next.reminder_days = days;
        }
        if let Some(days) = patch.warning_days {
            next.warning_days = days;
        }
        if let Some(days) = patch.critical_days {
            next.critical_days = days;
        }
        if let Some(cap) = patch.max_alerts_per_day {
            next.max_alerts_per_day = cap;
        }
        if let Some(hours) = patch.snooze_default_hours {
            next.snooze_default_hours = hours;
        }
        if let Some(quiet) = &patch.quiet_hours {
            next.quiet_hours = quiet.clone();
        }
        next
    }
}

/// Partial preference update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesPatch {
    pub enabled: Option<bool>,
    pub reminder_days: Option<i64>,
    pub warning_days: Option<i64>,
    pub critical_days: Option<i64>,
    pub max_alerts_per_day: Option<u32>,
    pub snooze_default_hours: Option<u32>,
    pub quiet_hours: Option<QuietHours>,
}

/// Loads and saves the preference record through a storage port.
pub struct PreferenceManager {
    storage: Box<dyn StoragePort>,
    current: AlertPreferences,
    degraded: bool,
}

impl PreferenceManager {
    /// Load the stored record, falling back to defaults on first run or
    /// when the stored payload is unreadable or invalid.
    pub fn new(storage: Box<dyn StoragePort>) -> Self {
        let current = match storage.read(STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<AlertPreferences>(&raw) {
                Ok(loaded) if loaded.validate().is_ok() => loaded,
                Ok(_) => {
                    warn!("stored alert preferences are invalid, using defaults");
                    AlertPreferences::default()
                }
                Err(err) => {
                    warn!("alert preferences unreadable, using defaults: {}", err);
                    AlertPreferences::default()
                }
            },
            Ok(None) => AlertPreferences::default(),
            Err(err) => {
                warn!("alert preferences unavailable, using defaults: {}", err);
                AlertPreferences::default()
            }
        };
        Self {
            storage,
            current,
            degraded: false,
        }
    }

    pub fn get(&self) -> &AlertPreferences {
        &self.current
    }

    /// True once a write has failed and the record is in-memory-only.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Merge a partial update onto the current record.
    ///
    /// Invalid merges are rejected and the prior record stays in effect.
    pub fn update(&mut self, patch: &PreferencesPatch) -> Result<AlertPreferences, AlertError> {
        let merged = self.current.merged(patch);
        merged.validate()?;

        match serde_json::to_string_pretty(&merged) {
            Ok(raw) => {
                if let Err(err) = self.storage.write(STORAGE_KEY, &raw) {
                    warn!("failed to persist alert preferences, keeping in-memory value: {}", err);
                    self.degraded = true;
                }
            }
            Err(err) => {
                warn!("failed to serialize alert preferences: {}", err);
                self.degraded = true;
            }
        }
        self.current = merged;
        Ok(self.current.clone())
    }
}
