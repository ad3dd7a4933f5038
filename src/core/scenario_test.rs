#[cfg(test)]
mod scenario_tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::core::alerts::model::{AlertPriority, AlertType, HistoryAction};
    use crate::core::alerts::service::{ExpirationAlertService, DEFAULT_RETENTION_DAYS};
    use crate::core::alerts::store::AlertStore;
    use crate::core::clock::{Clock, FixedClock};
    use crate::core::error::AlertError;
    use crate::core::model::InventoryItem;
    use crate::core::preferences::{PreferencesPatch, PreferenceManager, QuietHours};
    use crate::core::storage::MemoryStorage;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn service_at(start: DateTime<Utc>) -> (Arc<FixedClock>, ExpirationAlertService) {
        let clock = Arc::new(FixedClock::new(start));
        let store = AlertStore::new(Box::new(MemoryStorage::new()));
        let preferences = PreferenceManager::new(Box::new(MemoryStorage::new()));
        let service = ExpirationAlertService::new(store, preferences, clock.clone());
        (clock, service)
    }

    fn item(id: &str, expires_in: Duration, now: DateTime<Utc>) -> InventoryItem {
        InventoryItem {
            id: id.to_string(),
            name: id.to_string(),
            category: "Pantry".to_string(),
            expiration_date: Some(now + expires_in),
        }
    }

    #[test]
    fn scenario_two_days_out_raises_warning() {
        let (_, service) = service_at(noon());

        let created = service.check_expirations(&[item("milk", Duration::days(2), noon())]);
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].alert_type, AlertType::Warning);
        assert_eq!(created[0].priority, AlertPriority::Medium);
        assert_eq!(created[0].days_until_expiration, 2);

        let history = service.get_history(10);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, HistoryAction::Sent);
    }

    #[test]
    fn scenario_expired_yesterday_is_high_priority() {
        let (_, service) = service_at(noon());

        let created = service.check_expirations(&[item("milk", Duration::days(-1), noon())]);
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].alert_type, AlertType::Expired);
        assert_eq!(created[0].priority, AlertPriority::High);
        assert_eq!(created[0].days_until_expiration, -1);
    }

    #[test]
    fn scenario_check_is_idempotent() {
        let (_, service) = service_at(noon());
        let items = [item("milk", Duration::days(2), noon())];

        service.check_expirations(&items);
        service.check_expirations(&items);

        assert_eq!(service.get_active().len(), 1);
        // Only the original creation was recorded as sent
        let sent = service
            .get_history(10)
            .iter()
            .filter(|h| h.action == HistoryAction::Sent)
            .count();
        assert_eq!(sent, 1);
    }

    #[test]
    fn scenario_dismissed_alert_never_resurfaces() {
        let (_, service) = service_at(noon());
        let items = [item("milk", Duration::days(2), noon())];

        let created = service.check_expirations(&items);
        service.dismiss_alert(created[0].id).unwrap();
        assert!(service.get_active().is_empty());

        let touched = service.check_expirations(&items);
        assert!(touched.is_empty());
        assert!(service.get_active().is_empty());
    }

    #[test]
    fn scenario_snoozed_alert_reappears_after_elapse() {
        let (clock, service) = service_at(noon());

        let created = service.check_expirations(&[item("milk", Duration::days(2), noon())]);
        service.snooze_alert(created[0].id, Some(2)).unwrap();
        assert!(service.get_active().is_empty());

        clock.advance(Duration::hours(1));
        assert!(service.get_active().is_empty());

        clock.advance(Duration::hours(2));
        assert_eq!(service.get_active().len(), 1);
    }

    #[test]
    fn scenario_snooze_defaults_to_preference_hours() {
        let (clock, service) = service_at(noon());

        let created = service.check_expirations(&[item("milk", Duration::days(3), noon())]);
        service.snooze_alert(created[0].id, None).unwrap();

        // Default snooze is 24 hours
        clock.advance(Duration::hours(23));
        assert!(service.get_active().is_empty());
        clock.advance(Duration::hours(2));
        assert_eq!(service.get_active().len(), 1);
    }

    #[test]
    fn scenario_snooze_unknown_id_fails() {
        let (_, service) = service_at(noon());
        let err = service.snooze_alert(uuid::Uuid::new_v4(), None).unwrap_err();
        assert!(matches!(err, AlertError::NotFound(_)));
    }

    #[test]
    fn scenario_daily_cap_withholds_until_next_day() {
        let (clock, service) = service_at(noon());
        service
            .update_preferences(&PreferencesPatch {
                max_alerts_per_day: Some(1),
                ..PreferencesPatch::default()
            })
            .unwrap();

        let items = [
            item("flour", Duration::days(6), noon()),
            item("rice", Duration::days(7), noon()),
        ];

        let created = service.check_expirations(&items);
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].item_id, "flour");
        assert_eq!(service.get_alert_stats().withheld_today, 1);

        // Next local day: the withheld item surfaces
        clock.advance(Duration::days(1));
        let touched = service.check_expirations(&items);
        assert_eq!(touched.len(), 2);
        assert_eq!(service.get_active().len(), 2);
        assert_eq!(service.get_alert_stats().withheld_today, 0);
    }

    #[test]
    fn scenario_cleanup_respects_retention_window() {
        let (clock, service) = service_at(noon());

        let first = service.check_expirations(&[item("old", Duration::days(-1), noon())]);
        service.dismiss_alert(first[0].id).unwrap();

        clock.advance(Duration::days(2));
        let second =
            service.check_expirations(&[item("recent", Duration::days(-1), clock.now())]);
        service.dismiss_alert(second[0].id).unwrap();

        // 31 days after the first dismissal, 29 after the second
        clock.advance(Duration::days(29));
        let report = service.cleanup(DEFAULT_RETENTION_DAYS).unwrap();
        assert_eq!(report.removed_alerts, 1);

        let stats = service.get_alert_stats();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.dismissed, 1);

        let history = service.get_history(50);
        assert!(history
            .iter()
            .any(|h| h.alert_id == first[0].id && h.action == HistoryAction::Expired));
    }

    #[test]
    fn scenario_rejected_preference_update_keeps_prior() {
        let (_, service) = service_at(noon());

        let err = service
            .update_preferences(&PreferencesPatch {
                critical_days: Some(10),
                warning_days: Some(5),
                ..PreferencesPatch::default()
            })
            .unwrap_err();
        assert!(matches!(err, AlertError::Validation { .. }));

        let prefs = service.get_preferences();
        assert_eq!(prefs.critical_days, 1);
        assert_eq!(prefs.warning_days, 3);
        assert_eq!(prefs.reminder_days, 7);
    }

    #[test]
    fn scenario_quiet_hours_suppress_notification_flag() {
        let late = Utc.with_ymd_and_hms(2025, 6, 1, 23, 0, 0).unwrap();
        let (_, service) = service_at(late);
        service
            .update_preferences(&PreferencesPatch {
                quiet_hours: Some(QuietHours {
                    enabled: true,
                    start: "22:00".to_string(),
                    end: "07:00".to_string(),
                }),
                ..PreferencesPatch::default()
            })
            .unwrap();

        let created = service.check_expirations(&[item("milk", Duration::days(2), late)]);
        assert_eq!(created.len(), 1);
        assert!(!created[0].notification_sent);
        assert!(service
            .get_history(10)
            .iter()
            .all(|h| h.action != HistoryAction::Sent));
    }

    #[test]
    fn scenario_disabled_preferences_skip_evaluation() {
        let (_, service) = service_at(noon());
        service
            .update_preferences(&PreferencesPatch {
                enabled: Some(false),
                ..PreferencesPatch::default()
            })
            .unwrap();

        let created = service.check_expirations(&[item("milk", Duration::days(-1), noon())]);
        assert!(created.is_empty());
        assert!(service.get_active().is_empty());
    }

    #[test]
    fn scenario_refresh_recomputes_day_counts() {
        let (clock, service) = service_at(noon());

        service.check_expirations(&[item("milk", Duration::days(7), noon())]);
        clock.advance(Duration::days(3));
        service.refresh();

        let active = service.get_active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].days_until_expiration, 4);
        // The alert keeps its original classification until re-checked
        assert_eq!(active[0].alert_type, AlertType::Reminder);
    }
}
