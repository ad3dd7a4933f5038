//! Facade over evaluation, persistence and preferences.
//!
//! One instance is constructed at application start and shared by
//! reference across UI surfaces; an internal mutex serializes mutating
//! operations so concurrent callers cannot corrupt the store. Every
//! operation is a short synchronous computation plus a best-effort local
//! write; storage failures are absorbed by the store and never surface as
//! errors here.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Duration;
use log::debug;
use uuid::Uuid;

use super::model::{AlertStats, ExpirationAlert, HistoryEntry};
use super::rules;
use super::store::{AlertStore, CleanupReport};
use crate::core::clock::{Clock, SystemClock};
use crate::core::error::AlertError;
use crate::core::model::InventoryItem;
use crate::core::preferences::{AlertPreferences, PreferenceManager, PreferencesPatch};
use crate::core::storage::JsonFileStorage;

/// Retention window for `cleanup` callers that have no configured value.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

struct Inner {
    store: AlertStore,
    preferences: PreferenceManager,
}

pub struct ExpirationAlertService {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
    cleanup_running: AtomicBool,
}

impl ExpirationAlertService {
    pub fn new(
        store: AlertStore,
        preferences: PreferenceManager,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner { store, preferences }),
            clock,
            cleanup_running: AtomicBool::new(false),
        }
    }

    /// File-backed service with the system clock, persisting under
    /// `data_dir`.
    pub fn open(data_dir: PathBuf) -> Self {
        let store = AlertStore::new(Box::new(JsonFileStorage::new(data_dir.clone())));
        let preferences = PreferenceManager::new(Box::new(JsonFileStorage::new(data_dir)));
        Self::new(store, preferences, Arc::new(SystemClock))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Mutations are single-field writes; a poisoned guard still holds
        // usable state.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Evaluate `items` against the configured thresholds.
    ///
    /// Open alerts for an item/type are updated in place; new alerts are
    /// created subject to the daily cap, with candidates over the cap
    /// withheld (and counted) until the next local day. A dismissed alert
    /// permanently suppresses its item/type combination. Returns the
    /// alerts created or updated by this call.
    pub fn check_expirations(&self, items: &[InventoryItem]) -> Vec<ExpirationAlert> {
        let now = self.clock.now();
        let today = self.clock.local_date();
        let local_time = self.clock.local_time();

        let mut inner = self.lock();
        let prefs = inner.preferences.get().clone();
        if !prefs.enabled {
            return Vec::new();
        }
        let quiet = prefs.quiet_hours.contains(local_time);

        let mut touched = Vec::new();
        for item in items {
            let Some(class) = rules::classify(item.expiration_date, now, &prefs) else {
                continue;
            };
            let Some(expiration) = item.expiration_date else {
                continue;
            };

            let existing = inner
                .store
                .latest_for(&item.id, class.alert_type)
                .map(|a| (a.id, a.is_open()));
            match existing {
                Some((id, true)) => {
                    if let Some(updated) =
                        inner
                            .store
                            .update_days(id, expiration, class.days_until_expiration)
                    {
                        touched.push(updated);
                    }
                }
                // Dismissed: terminal for this item/type, never re-surfaced
                Some((_, false)) => {}
                None => {
                    if inner.store.quota_today(today).created >= prefs.max_alerts_per_day {
                        inner.store.note_withheld(today);
                        debug!("daily alert cap reached, withholding alert for item {}", item.id);
                        continue;
                    }
                    let alert = ExpirationAlert {
                        id: Uuid::new_v4(),
                        item_id: item.id.clone(),
                        item_name: item.name.clone(),
                        category: item.category.clone(),
                        expiration_date: expiration,
                        days_until_expiration: class.days_until_expiration,
                        alert_type: class.alert_type,
                        priority: class.alert_type.priority(),
                        created_at: now,
                        acknowledged: false,
                        snoozed_until: None,
                        dismissed_at: None,
                        notification_sent: !quiet,
                        email_sent: false,
                    };
                    touched.push(inner.store.insert(alert, today, !quiet));
                }
            }
        }
        touched
    }

    /// Mark an alert acknowledged. It stays in the active set;
    /// acknowledgement is informational, distinct from dismissal.
    pub fn acknowledge_alert(&self, id: Uuid) -> Result<ExpirationAlert, AlertError> {
        self.lock().store.acknowledge(id, self.clock.now())
    }

    /// Suppress an alert for `hours` (preference default when `None`).
    pub fn snooze_alert(
        &self,
        id: Uuid,
        hours: Option<u32>,
    ) -> Result<ExpirationAlert, AlertError> {
        let now = self.clock.now();
        let mut inner = self.lock();
        let hours = hours.unwrap_or(inner.preferences.get().snooze_default_hours);
        let until = now + Duration::hours(i64::from(hours));
        inner.store.snooze(id, until, now)
    }

    /// Dismiss an alert permanently.
    pub fn dismiss_alert(&self, id: Uuid) -> Result<ExpirationAlert, AlertError> {
        self.lock().store.dismiss(id, self.clock.now())
    }

    pub fn get_active(&self) -> Vec<ExpirationAlert> {
        self.lock().store.get_active(self.clock.now())
    }

    pub fn get_history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.lock().store.get_history(limit)
    }

    /// Recompute day counts for all open alerts against the current clock.
    pub fn refresh(&self) {
        self.lock().store.refresh(self.clock.now());
    }

    pub fn get_preferences(&self) -> AlertPreferences {
        self.lock().preferences.get().clone()
    }

    pub fn update_preferences(
        &self,
        patch: &PreferencesPatch,
    ) -> Result<AlertPreferences, AlertError> {
        self.lock().preferences.update(patch)
    }

    pub fn get_alert_stats(&self) -> AlertStats {
        let now = self.clock.now();
        let today = self.clock.local_date();
        self.lock().store.stats(now, today)
    }

    /// Prune history and dismissed alerts older than `retention_days`.
    ///
    /// Single-flight: returns `None` without touching state when another
    /// cleanup is already running.
    pub fn cleanup(&self, retention_days: u32) -> Option<CleanupReport> {
        if self.cleanup_running.swap(true, Ordering::SeqCst) {
            return None;
        }
        let now = self.clock.now();
        let cutoff = now - Duration::days(i64::from(retention_days));
        let report = self.lock().store.cleanup(cutoff, now);
        self.cleanup_running.store(false, Ordering::SeqCst);
        Some(report)
    }

    /// True when either backing store has fallen back to in-memory state.
    pub fn is_degraded(&self) -> bool {
        let inner = self.lock();
        inner.store.is_degraded() || inner.preferences.is_degraded()
    }
}
