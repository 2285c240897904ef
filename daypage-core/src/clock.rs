//! Wall-clock access for the gate and the entry store.
//!
//! Everything that depends on "now" or "today" goes through [`Clock`] so
//! that day boundaries can be exercised in tests.

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current time as epoch milliseconds
    fn now_millis(&self) -> i64;

    /// The current local calendar date
    fn today(&self) -> NaiveDate {
        local_date(self.now_millis())
    }
}

/// Clock backed by the system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A manually driven clock
#[derive(Debug, Default)]
pub struct FixedClock {
    millis: AtomicI64,
}

impl FixedClock {
    pub fn new(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    /// Start at local noon of the given date
    pub fn at_local_noon(date: NaiveDate) -> Self {
        Self::new(local_millis(date, 12, 0, 0))
    }

    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Convert epoch milliseconds to a local date-time
pub fn local_datetime(millis: i64) -> DateTime<Local> {
    DateTime::from_timestamp_millis(millis)
        .unwrap_or_default()
        .with_timezone(&Local)
}

/// Local calendar date containing the given instant
pub fn local_date(millis: i64) -> NaiveDate {
    local_datetime(millis).date_naive()
}

/// Epoch milliseconds of a local wall-clock time on `date`
///
/// Ambiguous local times resolve to the earlier instant; times that fall in
/// a DST gap fall back to the same wall-clock reading in UTC.
pub fn local_millis(date: NaiveDate, hour: u32, minute: u32, second: u32) -> i64 {
    let naive = date
        .and_hms_opt(hour, minute, second)
        .unwrap_or_else(|| date.and_hms_opt(0, 0, 0).unwrap_or_default());
    match Local.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.timestamp_millis(),
        None => naive.and_utc().timestamp_millis(),
    }
}
