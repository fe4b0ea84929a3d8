//! Read-only statistics derived from a document snapshot.
//!
//! Nothing in here touches the filesystem or mutates state; "now" is always
//! passed in.

pub mod calendar;
pub mod chart;
pub mod rate;
pub mod summary;

pub use crate::ledger::next_position;
pub use calendar::{CALENDAR_DAYS, CalendarDay, Streaks, calendar_data, streaks};
pub use chart::{ChartPoint, ChartSeries, Projection, chart_series};
pub use rate::{Eta, MIN_SPAN_MS, RateEstimate, rate_and_eta};
pub use summary::{
    MILESTONES, Milestone, ProgressSummary, daily_goal_percentage, milestones,
    progress_percentage, summarize,
};
