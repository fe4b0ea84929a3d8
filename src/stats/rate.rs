use crate::core::{Event, MS_PER_DAY};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Shortest span a rate is measured over, so a burst of events recorded in
/// the same instant does not divide by zero.
pub const MIN_SPAN_MS: i64 = 60_000;

/// Projected completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Eta {
    pub timestamp: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateEstimate {
    /// Events per day, rounded to two decimals.
    pub rate_per_day: f64,
    pub eta: Option<Eta>,
}

impl RateEstimate {
    fn without_eta(rate_per_day: f64) -> Self {
        Self {
            rate_per_day: round2(rate_per_day),
            eta: None,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Completion rate over the recorded events and the projected time at which
/// `total` is reached.
///
/// The rate spans first to last event, or first event to `now` when there is
/// only one. There is no ETA when nothing remains or the rate is zero.
pub fn rate_and_eta(total: u64, events: &[Event], now: DateTime<Utc>) -> RateEstimate {
    let timestamps = events.iter().map(|e| e.timestamp);
    let (Some(first), Some(last)) = (timestamps.clone().min(), timestamps.max()) else {
        return RateEstimate::without_eta(0.0);
    };

    let count = events.len();
    let now_ms = now.timestamp_millis();
    let end = if count >= 2 { last } else { now_ms };
    let span_ms = end.saturating_sub(first).max(MIN_SPAN_MS);
    let rate_per_day = count as f64 / (span_ms as f64 / MS_PER_DAY as f64);

    let remaining = total.saturating_sub(count as u64);
    if rate_per_day <= 0.0 || remaining == 0 {
        return RateEstimate::without_eta(rate_per_day);
    }

    let days_remaining = remaining as f64 / rate_per_day;
    let offset_ms = days_remaining * MS_PER_DAY as f64;
    // Projections past chrono's range have no calendar date to report.
    let eta = (offset_ms < i64::MAX as f64)
        .then(|| now_ms.checked_add(offset_ms as i64))
        .flatten()
        .and_then(DateTime::from_timestamp_millis)
        .map(|at| Eta {
            timestamp: at.timestamp_millis(),
            date: at.date_naive(),
        });

    RateEstimate {
        rate_per_day: round2(rate_per_day),
        eta,
    }
}
