use super::calendar::{Streaks, streaks};
use super::rate::{Eta, rate_and_eta};
use crate::core::{Document, Position};
use crate::ledger::next_position;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Percentages at which a milestone is reached.
pub const MILESTONES: [u8; 4] = [25, 50, 75, 100];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub threshold: u8,
    pub achieved: bool,
}

/// Share of the target completed, in [0, 100]. Zero when there is no target.
pub fn progress_percentage(completed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (completed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

pub fn milestones(percentage: f64) -> Vec<Milestone> {
    MILESTONES
        .iter()
        .map(|&threshold| Milestone {
            threshold,
            achieved: percentage >= f64::from(threshold),
        })
        .collect()
}

/// Today's progress against the daily goal. Zero for a non-positive goal.
pub fn daily_goal_percentage(today_progress: u64, daily_goal: i64) -> f64 {
    if daily_goal <= 0 {
        return 0.0;
    }
    today_progress as f64 / daily_goal as f64 * 100.0
}

/// Everything the overview screen shows, derived from one document snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub total: u64,
    pub completed: u64,
    pub remaining: u64,
    pub percentage: f64,
    pub milestones: Vec<Milestone>,
    pub rate_per_day: f64,
    pub eta: Option<Eta>,
    pub daily_goal: i64,
    pub today_progress: u64,
    pub daily_percentage: f64,
    pub next_position: Position,
    pub streaks: Streaks,
}

impl ProgressSummary {
    pub fn achieved_milestones(&self) -> Vec<u8> {
        self.milestones
            .iter()
            .filter(|m| m.achieved)
            .map(|m| m.threshold)
            .collect()
    }
}

pub fn summarize(document: &Document, now: DateTime<Utc>) -> ProgressSummary {
    let today = now.date_naive();
    let completed = document.completed();
    let percentage = progress_percentage(completed, document.total);
    let estimate = rate_and_eta(document.total, &document.events, now);
    let today_progress = document.progress_on(today);

    ProgressSummary {
        total: document.total,
        completed,
        remaining: document.remaining(),
        percentage,
        milestones: milestones(percentage),
        rate_per_day: estimate.rate_per_day,
        eta: estimate.eta,
        daily_goal: document.daily_goal,
        today_progress,
        daily_percentage: daily_goal_percentage(today_progress, document.daily_goal),
        next_position: next_position(&document.events),
        streaks: streaks(&document.daily_progress, today),
    }
}
