//! Wall-clock and calendar access.
//!
//! Daily stats are keyed by the local calendar date and rewards expire at
//! the next local midnight, so everything that needs "now" goes through a
//! [`Clock`]. Production code uses [`SystemClock`]; tests drive a
//! [`ManualClock`] pinned to a fixed UTC offset.

use std::sync::Mutex;

use chrono::{
    DateTime, Duration, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone,
};

/// Format used for daily stats keys and backup file names.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of the current instant and local calendar date.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;

    /// Today's date in local time.
    fn today(&self) -> NaiveDate;

    /// Epoch milliseconds of local midnight at the start of tomorrow.
    fn start_of_next_day_ms(&self) -> i64;

    /// Today's date as `YYYY-MM-DD`.
    fn today_key(&self) -> String {
        date_key(self.today())
    }
}

/// Format a date as a daily stats key.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn next_midnight(date: NaiveDate) -> NaiveDateTime {
    date.succ_opt()
        .unwrap_or(date)
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
}

/// Clock backed by the operating system's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Local::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn start_of_next_day_ms(&self) -> i64 {
        let midnight = next_midnight(self.today());
        match Local.from_local_datetime(&midnight) {
            LocalResult::Single(t) => t.timestamp_millis(),
            LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
            // Midnight skipped by a DST jump; the first valid instant is an hour later.
            LocalResult::None => Local
                .from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
                .map(|t| t.timestamp_millis())
                .unwrap_or_else(|| midnight.and_utc().timestamp_millis()),
        }
    }
}

/// Settable clock at a fixed UTC offset.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock at `hour:minute` local time on `date`, in UTC.
    ///
    /// Returns `None` for an invalid date or time.
    pub fn at(date: &str, hour: u32, minute: u32) -> Option<Self> {
        Self::at_offset(date, hour, minute, 0)
    }

    /// Clock at `hour:minute` on `date` with the given UTC offset in seconds.
    pub fn at_offset(date: &str, hour: u32, minute: u32, offset_secs: i32) -> Option<Self> {
        let date = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
        let naive = date.and_hms_opt(hour, minute, 0)?;
        let offset = FixedOffset::east_opt(offset_secs)?;
        let now = offset.from_local_datetime(&naive).single()?;
        Some(Self::new(now))
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        *self.lock()
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<FixedOffset>> {
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn start_of_next_day_ms(&self) -> i64 {
        let now = self.now();
        let midnight = next_midnight(now.date_naive());
        now.offset()
            .from_local_datetime(&midnight)
            .single()
            .map(|t| t.timestamp_millis())
            .unwrap_or_else(|| midnight.and_utc().timestamp_millis())
    }
}
