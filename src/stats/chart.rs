use super::rate::rate_and_eta;
use crate::core::{Event, MS_PER_MINUTE};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One point of the cumulative progress curve: minutes since the first event
/// and the number of events recorded by then.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub t: f64,
    pub y: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    pub from: ChartPoint,
    pub to: ChartPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub points: Vec<ChartPoint>,
    pub total: u64,
    /// Projected completion in epoch milliseconds.
    pub eta: Option<i64>,
    pub rate_per_day: f64,
    /// Straight line from the last point to the target at the ETA.
    pub projection: Option<Projection>,
}

fn minutes_between(from_ms: i64, to_ms: i64) -> f64 {
    to_ms.saturating_sub(from_ms) as f64 / MS_PER_MINUTE as f64
}

pub fn chart_series(total: u64, events: &[Event], now: DateTime<Utc>) -> ChartSeries {
    let mut timestamps: Vec<i64> = events.iter().map(|e| e.timestamp).collect();
    timestamps.sort_unstable();
    let first = timestamps.first().copied().unwrap_or(0);

    let points: Vec<ChartPoint> = timestamps
        .iter()
        .enumerate()
        .map(|(index, ts)| ChartPoint {
            t: minutes_between(first, *ts),
            y: index as u64 + 1,
        })
        .collect();

    let estimate = rate_and_eta(total, events, now);
    let eta = estimate.eta.map(|eta| eta.timestamp);
    let projection = match (eta, points.last()) {
        (Some(eta), Some(last)) => Some(Projection {
            from: *last,
            to: ChartPoint {
                t: minutes_between(first, eta),
                y: total,
            },
        }),
        _ => None,
    };

    ChartSeries {
        points,
        total,
        eta,
        rate_per_day: estimate.rate_per_day,
        projection,
    }
}
