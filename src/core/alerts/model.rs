//! Data model for expiration alerts and their lifecycle.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::model::{CategoryName, ItemId};

/// Urgency classification of an expiring item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Expired,
    Critical,
    Warning,
    Reminder,
}

impl AlertType {
    /// Priority bucket for this alert type.
    pub fn priority(&self) -> AlertPriority {
        match self {
            Self::Expired | Self::Critical => AlertPriority::High,
            Self::Warning => AlertPriority::Medium,
            Self::Reminder => AlertPriority::Low,
        }
    }

    /// Get the display name for this alert type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Expired => "Expired",
            Self::Critical => "Expires Very Soon",
            Self::Warning => "Expires Soon",
            Self::Reminder => "Expiration Reminder",
        }
    }

    /// All alert types, most urgent first.
    pub fn all() -> &'static [AlertType] {
        &[Self::Expired, Self::Critical, Self::Warning, Self::Reminder]
    }
}

/// Priority derived from the alert type, ordered so `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
}

/// An alert raised for a single inventory item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpirationAlert {
    pub id: Uuid,
    pub item_id: ItemId,
    pub item_name: String,
    pub category: CategoryName,
    pub expiration_date: DateTime<Utc>,
    /// Recomputed on every check/refresh, not a durable truth.
    pub days_until_expiration: i64,
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub created_at: DateTime<Utc>,
    /// Monotonic; never unset once acknowledged.
    #[serde(default)]
    pub acknowledged: bool,
    /// While in the future the alert is hidden from active views.
    #[serde(default)]
    pub snoozed_until: Option<DateTime<Utc>>,
    /// Terminal once set.
    #[serde(default)]
    pub dismissed_at: Option<DateTime<Utc>>,
    /// Delivery extension points; no delivery mechanism is wired up.
    #[serde(default)]
    pub notification_sent: bool,
    #[serde(default)]
    pub email_sent: bool,
}

impl ExpirationAlert {
    /// Whether the alert has not been dismissed.
    pub fn is_open(&self) -> bool {
        self.dismissed_at.is_none()
    }

    /// Whether the alert is currently snoozed.
    pub fn is_snoozed(&self, now: DateTime<Utc>) -> bool {
        self.snoozed_until.is_some_and(|until| until > now)
    }

    /// Open and not snoozed.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && !self.is_snoozed(now)
    }
}

/// Lifecycle transition recorded in the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Sent,
    Acknowledged,
    Snoozed,
    Dismissed,
    Expired,
}

/// Append-only log entry for a single lifecycle transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub alert_id: Uuid,
    pub action: HistoryAction,
    pub at: DateTime<Utc>,
}

/// Aggregate counts over the current alert set. Derived on demand, never
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStats {
    pub total: usize,
    pub active: usize,
    pub acknowledged: usize,
    pub snoozed: usize,
    pub dismissed: usize,
    pub by_type: HashMap<AlertType, usize>,
    /// Alerts withheld today by the daily cap.
    pub withheld_today: u32,
}
