//! Brings a freshly read data file up to the current document shape.
//!
//! Older installations stored each event as a bare millisecond timestamp and
//! had no daily goal or daily progress. Everything is read leniently: values
//! that cannot be interpreted fall back to their defaults instead of failing
//! the load.

use crate::core::{DEFAULT_DAILY_GOAL, Document, Event, ITEMS_PER_PAGE};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// An integer as it may appear in hand-edited or older files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LooseInt {
    Int(i64),
    Float(f64),
    Text(String),
}

impl LooseInt {
    fn get(&self) -> Option<i64> {
        match self {
            LooseInt::Int(n) => Some(*n),
            LooseInt::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            LooseInt::Float(_) => None,
            LooseInt::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| LooseInt::Float(s.parse::<f64>().ok()?).get())
            }
        }
    }
}

/// Event entry as stored on disk: either a bare timestamp (legacy) or an
/// object with optional coordinates.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredEvent {
    Legacy(LooseInt),
    Full(StoredFields),
}

#[derive(Debug, Deserialize)]
struct StoredFields {
    #[serde(alias = "timestamp")]
    ts: LooseInt,
    #[serde(default)]
    page: Option<LooseInt>,
    #[serde(default, alias = "item_number")]
    question_number: Option<LooseInt>,
}

impl StoredEvent {
    fn into_event(self) -> Option<Event> {
        match self {
            StoredEvent::Legacy(ts) => ts.get().map(Event::legacy),
            StoredEvent::Full(fields) => {
                let timestamp = fields.ts.get()?;
                let page = fields
                    .page
                    .and_then(|p| p.get())
                    .filter(|p| *p >= 1)
                    .and_then(|p| u32::try_from(p).ok());
                let item_number = fields
                    .question_number
                    .and_then(|q| q.get())
                    .filter(|q| (1..=ITEMS_PER_PAGE as i64).contains(q))
                    .map(|q| q as u8);
                Some(Event {
                    timestamp,
                    page,
                    item_number,
                })
            }
        }
    }
}

fn loose_int(value: Value) -> Option<i64> {
    serde_json::from_value::<LooseInt>(value).ok()?.get()
}

/// Normalize a raw JSON document into the current [`Document`] shape.
///
/// Missing fields get their defaults, bare-timestamp events become
/// [`Event`]s without coordinates, and events are ordered by timestamp.
/// Never fails, and normalizing an already current document changes nothing.
pub fn normalize(raw: Value) -> Document {
    let mut fields = match raw {
        Value::Object(fields) => fields,
        other => {
            warn!(kind = json_kind(&other), "data file root is not an object, using defaults");
            return Document::default();
        }
    };

    let total = fields
        .remove("total")
        .and_then(loose_int)
        .map(|n| n.max(0) as u64)
        .unwrap_or(0);
    let daily_goal = fields
        .remove("daily_goal")
        .and_then(loose_int)
        .unwrap_or(DEFAULT_DAILY_GOAL);
    let events = normalize_events(fields.remove("events"));
    let daily_progress = normalize_daily_progress(fields.remove("daily_progress"));

    Document {
        total,
        events,
        daily_goal,
        daily_progress,
    }
}

fn normalize_events(raw: Option<Value>) -> Vec<Event> {
    let entries = match raw {
        Some(Value::Array(entries)) => entries,
        Some(Value::Null) | None => return Vec::new(),
        Some(other) => {
            warn!(kind = json_kind(&other), "events is not a list, dropping it");
            return Vec::new();
        }
    };

    let mut legacy = 0usize;
    let mut events = Vec::with_capacity(entries.len());
    for entry in entries {
        let stored = match serde_json::from_value::<StoredEvent>(entry) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "discarding unreadable event entry");
                continue;
            }
        };
        if matches!(stored, StoredEvent::Legacy(_)) {
            legacy += 1;
        }
        match stored.into_event() {
            Some(event) => events.push(event),
            None => warn!("discarding event entry without a usable timestamp"),
        }
    }

    if legacy > 0 {
        debug!(legacy, "upgraded bare-timestamp events");
    }

    events.sort_by_key(|e| e.timestamp);
    events
}

fn normalize_daily_progress(raw: Option<Value>) -> BTreeMap<NaiveDate, u64> {
    let entries: Map<String, Value> = match raw {
        Some(Value::Object(entries)) => entries,
        Some(Value::Null) | None => return BTreeMap::new(),
        Some(other) => {
            warn!(kind = json_kind(&other), "daily_progress is not a map, dropping it");
            return BTreeMap::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|(date, count)| {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok()?;
            let count = u64::try_from(loose_int(count)?).ok()?;
            Some((date, count))
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
