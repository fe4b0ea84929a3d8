use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Days covered by the heatmap, today included.
pub const CALENDAR_DAYS: u64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub count: u64,
}

/// Days within the trailing year ending `today` that have any progress,
/// oldest first. Days without progress are left out.
pub fn calendar_data(daily_progress: &BTreeMap<NaiveDate, u64>, today: NaiveDate) -> Vec<CalendarDay> {
    let start = today
        .checked_sub_days(Days::new(CALENDAR_DAYS - 1))
        .unwrap_or(NaiveDate::MIN);

    daily_progress
        .range(start..=today)
        .filter(|(_, count)| **count > 0)
        .map(|(date, count)| CalendarDay {
            date: *date,
            count: *count,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streaks {
    /// Consecutive active days ending today, or yesterday if nothing has been
    /// recorded today yet.
    pub current: u32,
    pub longest: u32,
}

pub fn streaks(daily_progress: &BTreeMap<NaiveDate, u64>, today: NaiveDate) -> Streaks {
    let active = |date: NaiveDate| daily_progress.get(&date).is_some_and(|count| *count > 0);

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;
    for date in daily_progress.iter().filter(|(_, c)| **c > 0).map(|(d, _)| *d) {
        run = match previous.and_then(|p| p.succ_opt()) {
            Some(expected) if expected == date => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(date);
    }

    let mut current = 0u32;
    let mut day = if active(today) { Some(today) } else { today.pred_opt() };
    while let Some(date) = day.filter(|d| active(*d)) {
        current += 1;
        day = date.pred_opt();
    }

    Streaks { current, longest }
}
