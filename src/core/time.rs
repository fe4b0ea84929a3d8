use chrono::{DateTime, Duration, NaiveDate, Utc};

pub const MS_PER_MINUTE: i64 = 60_000;
pub const MS_PER_DAY: i64 = 86_400_000;

/// Source of "now" for statistics, so tests can pin the wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Fixed clock at the given epoch milliseconds; out-of-range values pin
    /// the epoch.
    pub fn fixed_millis(ms: i64) -> Self {
        Self::Fixed(DateTime::from_timestamp_millis(ms).unwrap_or_default())
    }

    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    pub fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Has no effect on `Clock::System`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// UTC calendar date of an epoch-millisecond timestamp, clamped to the range
/// chrono can represent.
pub fn utc_date(ms: i64) -> NaiveDate {
    match DateTime::from_timestamp_millis(ms) {
        Some(dt) => dt.date_naive(),
        None if ms < 0 => NaiveDate::MIN,
        None => NaiveDate::MAX,
    }
}
