use super::time::utc_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Items grouped on one page.
pub const ITEMS_PER_PAGE: u8 = 10;

pub const DEFAULT_DAILY_GOAL: i64 = 10;

/// Structural coordinate of an event: a page and the item within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub page: u32,
    #[serde(rename = "question_number")]
    pub item_number: u8,
}

impl Position {
    pub fn new(page: u32, item_number: u8) -> Self {
        Self { page, item_number }
    }

    /// Position of the `index`-th item (zero based) when items are laid out
    /// page after page.
    pub fn from_ordinal(index: usize) -> Self {
        let per_page = ITEMS_PER_PAGE as usize;
        Self {
            page: u32::try_from(index / per_page + 1).unwrap_or(u32::MAX),
            item_number: (index % per_page) as u8 + 1,
        }
    }

    /// The position that follows this one, wrapping to the next page after
    /// the last item.
    pub fn next(self) -> Self {
        if self.item_number >= ITEMS_PER_PAGE {
            Self::new(self.page.saturating_add(1), 1)
        } else {
            Self::new(self.page, self.item_number + 1)
        }
    }
}

/// One recorded completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "ts")]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(
        rename = "question_number",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub item_number: Option<u8>,
}

impl Event {
    /// An event without coordinates, as recorded before numbering existed.
    pub fn legacy(timestamp: i64) -> Self {
        Self {
            timestamp,
            page: None,
            item_number: None,
        }
    }

    pub fn at(timestamp: i64, position: Position) -> Self {
        Self {
            timestamp,
            page: Some(position.page),
            item_number: Some(position.item_number),
        }
    }

    pub fn position(&self) -> Option<Position> {
        match (self.page, self.item_number) {
            (Some(page), Some(item_number)) => Some(Position::new(page, item_number)),
            _ => None,
        }
    }

    pub fn is_numbered(&self) -> bool {
        self.position().is_some()
    }

    pub fn utc_date(&self) -> NaiveDate {
        utc_date(self.timestamp)
    }
}

/// The whole persisted state of one installation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub total: u64,
    pub events: Vec<Event>,
    pub daily_goal: i64,
    pub daily_progress: BTreeMap<NaiveDate, u64>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            total: 0,
            events: Vec::new(),
            daily_goal: DEFAULT_DAILY_GOAL,
            daily_progress: BTreeMap::new(),
        }
    }
}

impl Document {
    pub fn completed(&self) -> u64 {
        self.events.len() as u64
    }

    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.completed())
    }

    pub fn progress_on(&self, date: NaiveDate) -> u64 {
        self.daily_progress.get(&date).copied().unwrap_or(0)
    }
}
