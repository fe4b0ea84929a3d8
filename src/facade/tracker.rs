use crate::core::{Clock, Document, Event, Position, Result};
use crate::ledger;
use crate::stats::{self, CalendarDay, ChartSeries, ProgressSummary, RateEstimate, Streaks};
use crate::storage::DocumentStore;
use chrono::NaiveDate;
use std::path::Path;
use tracing::info;

/// Progress tracker backed by a single data file.
///
/// Every mutation is one locked read-modify-write of the whole document;
/// every query reads the latest persisted snapshot.
///
/// # Examples
///
/// ```
/// use tallydb::ProgressTracker;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::TempDir::new()?;
/// let tracker = ProgressTracker::open(dir.path())?;
///
/// tracker.set_total(40)?;
/// let event = tracker.add_event(1_700_000_000_000, None, None)?;
/// assert_eq!((event.page, event.item_number), (Some(1), Some(1)));
/// assert_eq!(tracker.events()?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ProgressTracker {
    store: DocumentStore,
    clock: Clock,
}

impl ProgressTracker {
    /// Open the tracker at a data file, or at a directory holding one.
    ///
    /// Creates the file with an empty document if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            store: DocumentStore::open(path)?,
            clock: Clock::System,
        })
    }

    /// Replace the clock used for "now" and "today".
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn document(&self) -> Result<Document> {
        self.store.load()
    }

    pub fn total(&self) -> Result<u64> {
        Ok(self.store.load()?.total)
    }

    /// Set the target count. Negative values are stored as 0.
    pub fn set_total(&self, total: i64) -> Result<()> {
        self.store.update(|doc| ledger::set_total(doc, total))
    }

    /// All events, oldest first.
    pub fn events(&self) -> Result<Vec<Event>> {
        Ok(self.store.load()?.events)
    }

    /// Record a completion at `timestamp_ms`, auto-assigning any coordinate
    /// not given.
    pub fn add_event(
        &self,
        timestamp_ms: i64,
        page: Option<i64>,
        item_number: Option<i64>,
    ) -> Result<Event> {
        self.store
            .update(|doc| ledger::append(doc, timestamp_ms, page, item_number))
    }

    /// Record a completion at the current time.
    pub fn record_now(&self, page: Option<i64>, item_number: Option<i64>) -> Result<Event> {
        self.add_event(self.clock.now_ms(), page, item_number)
    }

    pub fn daily_goal(&self) -> Result<i64> {
        Ok(self.store.load()?.daily_goal)
    }

    pub fn set_daily_goal(&self, goal: i64) -> Result<()> {
        self.store.update(|doc| ledger::set_daily_goal(doc, goal))
    }

    pub fn daily_progress(&self, date: NaiveDate) -> Result<u64> {
        Ok(self.store.load()?.progress_on(date))
    }

    pub fn today_progress(&self) -> Result<u64> {
        self.daily_progress(self.clock.today())
    }

    /// Clear the target, events and daily progress, keeping the daily goal.
    pub fn reset(&self) -> Result<()> {
        let cleared = self.store.update(|doc| {
            let count = doc.events.len();
            ledger::reset(doc);
            count
        })?;
        info!(events = cleared, "reset progress");
        Ok(())
    }

    pub fn rate_and_eta(&self) -> Result<RateEstimate> {
        let doc = self.store.load()?;
        Ok(stats::rate_and_eta(doc.total, &doc.events, self.clock.now()))
    }

    /// Active days in the trailing year.
    pub fn calendar_data(&self) -> Result<Vec<CalendarDay>> {
        let doc = self.store.load()?;
        Ok(stats::calendar_data(&doc.daily_progress, self.clock.today()))
    }

    pub fn chart_series(&self) -> Result<ChartSeries> {
        let doc = self.store.load()?;
        Ok(stats::chart_series(doc.total, &doc.events, self.clock.now()))
    }

    /// Where the next event would land if recorded without coordinates.
    pub fn next_position(&self) -> Result<Position> {
        Ok(stats::next_position(&self.store.load()?.events))
    }

    pub fn streaks(&self) -> Result<Streaks> {
        let doc = self.store.load()?;
        Ok(stats::streaks(&doc.daily_progress, self.clock.today()))
    }

    pub fn summary(&self) -> Result<ProgressSummary> {
        Ok(stats::summarize(&self.store.load()?, self.clock.now()))
    }
}
