//! Persisted alert state: current alerts, history log and daily quota.
//!
//! The whole state is serialized as one JSON document through the storage
//! port. Storage failures degrade the store to in-memory-only for the
//! session; they are logged and never propagated to callers.

use chrono::{DateTime, NaiveDate, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{AlertStats, AlertType, ExpirationAlert, HistoryAction, HistoryEntry};
use super::rules;
use crate::core::error::AlertError;
use crate::core::storage::StoragePort;

const STORAGE_KEY: &str = "expiration_alerts";

/// Per-day accounting for the `max_alerts_per_day` cap.
///
/// Resets when the local calendar date changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyQuota {
    pub date: Option<NaiveDate>,
    pub created: u32,
    pub withheld: u32,
}

impl DailyQuota {
    fn roll_over(&mut self, today: NaiveDate) {
        if self.date != Some(today) {
            self.date = Some(today);
            self.created = 0;
            self.withheld = 0;
        }
    }
}

/// Counts reported by a cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed_alerts: usize,
    pub pruned_history: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    alerts: Vec<ExpirationAlert>,
    history: Vec<HistoryEntry>,
    #[serde(default)]
    quota: DailyQuota,
}

/// Authoritative holder of alerts and their history.
pub struct AlertStore {
    storage: Box<dyn StoragePort>,
    state: StoreState,
    degraded: bool,
}

impl AlertStore {
    /// Load the stored state, starting empty on first run or when the
    /// stored payload is unreadable.
    pub fn new(storage: Box<dyn StoragePort>) -> Self {
        let state = match storage.read(STORAGE_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!("alert store unreadable, starting empty: {}", err);
                StoreState::default()
            }),
            Ok(None) => StoreState::default(),
            Err(err) => {
                warn!("alert store unavailable, starting empty: {}", err);
                StoreState::default()
            }
        };
        Self {
            storage,
            state,
            degraded: false,
        }
    }

    /// True once a write has failed and the store is in-memory-only.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn persist(&mut self) {
        let raw = match serde_json::to_string_pretty(&self.state) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("failed to serialize alert store: {}", err);
                self.degraded = true;
                return;
            }
        };
        if let Err(err) = self.storage.write(STORAGE_KEY, &raw) {
            warn!("failed to persist alert store, continuing in memory: {}", err);
            self.degraded = true;
        }
    }

    fn record(&mut self, alert_id: Uuid, action: HistoryAction, at: DateTime<Utc>) {
        self.state.history.push(HistoryEntry {
            alert_id,
            action,
            at,
        });
    }

    /// Most recent alert for this item and type, in any lifecycle state.
    ///
    /// A dismissed match means the combination is terminal and must not be
    /// re-surfaced by upserts.
    pub fn latest_for(&self, item_id: &str, alert_type: AlertType) -> Option<&ExpirationAlert> {
        self.state
            .alerts
            .iter()
            .rev()
            .find(|a| a.item_id == item_id && a.alert_type == alert_type)
    }

    /// Insert a newly created alert, counting it against today's quota.
    pub fn insert(
        &mut self,
        alert: ExpirationAlert,
        today: NaiveDate,
        record_sent: bool,
    ) -> ExpirationAlert {
        self.state.quota.roll_over(today);
        self.state.quota.created += 1;
        if record_sent {
            self.record(alert.id, HistoryAction::Sent, alert.created_at);
        }
        self.state.alerts.push(alert.clone());
        self.persist();
        alert
    }

    /// Refresh an open alert in place after re-evaluation.
    pub fn update_days(
        &mut self,
        id: Uuid,
        expiration: DateTime<Utc>,
        days: i64,
    ) -> Option<ExpirationAlert> {
        let alert = self
            .state
            .alerts
            .iter_mut()
            .find(|a| a.id == id && a.is_open())?;
        alert.expiration_date = expiration;
        alert.days_until_expiration = days;
        let snapshot = alert.clone();
        self.persist();
        Some(snapshot)
    }

    /// Today's quota counters, rolling over if the date changed.
    pub fn quota_today(&mut self, today: NaiveDate) -> DailyQuota {
        self.state.quota.roll_over(today);
        self.state.quota
    }

    /// Count a candidate withheld by the daily cap.
    pub fn note_withheld(&mut self, today: NaiveDate) {
        self.state.quota.roll_over(today);
        self.state.quota.withheld += 1;
        self.persist();
    }

    /// Active alerts: not dismissed and not currently snoozed, most urgent
    /// first (priority descending, then days ascending).
    pub fn get_active(&self, now: DateTime<Utc>) -> Vec<ExpirationAlert> {
        let mut active: Vec<ExpirationAlert> = self
            .state
            .alerts
            .iter()
            .filter(|a| a.is_active(now))
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.days_until_expiration.cmp(&b.days_until_expiration))
        });
        active
    }

    /// Most recent `limit` history entries, newest first.
    pub fn get_history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.state.history.iter().rev().take(limit).cloned().collect()
    }

    /// Mark an alert acknowledged. Acknowledgement is informational; the
    /// alert stays in the active set.
    pub fn acknowledge(
        &mut self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ExpirationAlert, AlertError> {
        let alert = self
            .state
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AlertError::NotFound(id))?;
        if alert.dismissed_at.is_some() {
            return Err(AlertError::Dismissed(id));
        }
        alert.acknowledged = true;
        let snapshot = alert.clone();
        self.record(id, HistoryAction::Acknowledged, at);
        self.persist();
        Ok(snapshot)
    }

    /// Suppress an alert from active views until `until`.
    pub fn snooze(
        &mut self,
        id: Uuid,
        until: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<ExpirationAlert, AlertError> {
        let alert = self
            .state
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AlertError::NotFound(id))?;
        if alert.dismissed_at.is_some() {
            return Err(AlertError::Dismissed(id));
        }
        alert.snoozed_until = Some(until);
        let snapshot = alert.clone();
        self.record(id, HistoryAction::Snoozed, at);
        self.persist();
        Ok(snapshot)
    }

    /// Dismiss an alert. Terminal; dismissing again is a no-op.
    pub fn dismiss(&mut self, id: Uuid, at: DateTime<Utc>) -> Result<ExpirationAlert, AlertError> {
        let alert = self
            .state
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AlertError::NotFound(id))?;
        if alert.dismissed_at.is_some() {
            return Ok(alert.clone());
        }
        alert.dismissed_at = Some(at);
        let snapshot = alert.clone();
        self.record(id, HistoryAction::Dismissed, at);
        self.persist();
        Ok(snapshot)
    }

    /// Recompute day counts for all open alerts.
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        let mut changed = false;
        for alert in self.state.alerts.iter_mut().filter(|a| a.is_open()) {
            let days = rules::days_until(alert.expiration_date, now);
            if days != alert.days_until_expiration {
                alert.days_until_expiration = days;
                changed = true;
            }
        }
        if changed {
            self.persist();
        }
    }

    /// Aggregate counts over the current alert set.
    pub fn stats(&mut self, now: DateTime<Utc>, today: NaiveDate) -> AlertStats {
        self.state.quota.roll_over(today);
        let mut stats = AlertStats::default();
        for alert in &self.state.alerts {
            stats.total += 1;
            if alert.dismissed_at.is_some() {
                stats.dismissed += 1;
            } else if alert.is_snoozed(now) {
                stats.snoozed += 1;
            }
            if alert.is_active(now) {
                stats.active += 1;
            }
            if alert.acknowledged {
                stats.acknowledged += 1;
            }
            *stats.by_type.entry(alert.alert_type).or_insert(0) += 1;
        }
        stats.withheld_today = self.state.quota.withheld;
        stats
    }

    /// Drop dismissed alerts and history entries older than `cutoff`.
    ///
    /// Each removed alert gets a final `Expired` history marker stamped at
    /// `now` before it is dropped, so the removal itself stays visible in
    /// history until the next retention window passes.
    pub fn cleanup(&mut self, cutoff: DateTime<Utc>, now: DateTime<Utc>) -> CleanupReport {
        let expired_ids: Vec<Uuid> = self
            .state
            .alerts
            .iter()
            .filter(|a| a.dismissed_at.is_some_and(|at| at < cutoff))
            .map(|a| a.id)
            .collect();
        for id in &expired_ids {
            self.record(*id, HistoryAction::Expired, now);
        }
        self.state
            .alerts
            .retain(|a| !a.dismissed_at.is_some_and(|at| at < cutoff));

        let before = self.state.history.len();
        self.state.history.retain(|entry| entry.at >= cutoff);
        let pruned = before - self.state.history.len();

        let report = CleanupReport {
            removed_alerts: expired_ids.len(),
            pruned_history: pruned,
        };
        if report.removed_alerts > 0 || report.pruned_history > 0 {
            self.persist();
        }
        report
    }
}
