/// Time source for the tracker
///
/// Everything that depends on "now" (journey starts, daily caps, scoring
/// windows, conversation deadlines) reads it through [`Clock`], so tests
/// can pin time with [`ManualClock`].

use std::sync::Mutex;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveTime, Offset, TimeZone, Utc};

/// Supplies the current instant and the start of the current local day
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Local midnight of the day `now()` falls in, expressed in UTC
    fn local_midnight(&self) -> DateTime<Utc>;
}

/// Whole days between two instants: hours truncated toward zero, then
/// divided by 24 (again truncating)
pub fn elapsed_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_hours() / 24
}

fn midnight_in<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let local = instant.with_timezone(tz);
    let naive = local.date_naive().and_time(NaiveTime::MIN);
    // A DST gap can swallow midnight; fall back to the earliest valid
    // instant of that day.
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(instant)
}

/// Wall clock, with day boundaries in the system zone or a fixed offset
#[derive(Debug, Clone, Default)]
pub struct SystemClock {
    offset: Option<FixedOffset>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { offset: None }
    }

    /// Use a fixed UTC offset for day boundaries instead of the system zone
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self { offset: Some(offset) }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_midnight(&self) -> DateTime<Utc> {
        let now = self.now();
        match &self.offset {
            Some(offset) => midnight_in(now, offset),
            None => midnight_in(now, &Local),
        }
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    offset: FixedOffset,
}

impl ManualClock {
    /// Start at `now`, with day boundaries at UTC midnight
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_offset(now, Utc.fix())
    }

    pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { now: Mutex::new(now), offset }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn local_midnight(&self) -> DateTime<Utc> {
        midnight_in(self.now(), &self.offset)
    }
}
