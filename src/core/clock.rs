use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};

/// Time source injected into the alert service.
///
/// Threshold evaluation, snooze expiry and the daily cap all depend on
/// "now"; injecting it keeps date arithmetic testable without wall-clock
/// time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date in the host's local timezone. The daily alert cap
    /// rolls over when this changes (local midnight).
    fn local_date(&self) -> NaiveDate;

    /// Time of day in the host's local timezone, used for quiet hours.
    fn local_time(&self) -> NaiveTime;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_date(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn local_time(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// Settable clock for deterministic tests.
///
/// Local date/time are derived from the UTC instant so results do not
/// depend on the host timezone.
pub struct FixedClock {
    instant: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            instant: Mutex::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self
            .instant
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut instant = self
            .instant
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *instant = *instant + by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self
            .instant
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn local_date(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn local_time(&self) -> NaiveTime {
        self.now().time()
    }
}
