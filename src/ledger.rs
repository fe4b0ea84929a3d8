//! Event insertion and the auto-numbering rules.
//!
//! Everything here works on an in-memory [`Document`]; persisting the result
//! is the caller's job.

use crate::core::{Document, Event, ITEMS_PER_PAGE, Position};
use tracing::{debug, info};

/// Chronologically latest event that carries both coordinates.
fn latest_numbered(events: &[Event]) -> Option<Position> {
    events
        .iter()
        .filter(|e| e.is_numbered())
        .max_by_key(|e| e.timestamp)
        .and_then(Event::position)
}

fn legacy_count(events: &[Event]) -> usize {
    events.iter().filter(|e| !e.is_numbered()).count()
}

fn clamp_page(page: i64) -> u32 {
    u32::try_from(page.max(1)).unwrap_or(u32::MAX)
}

fn valid_item(item_number: i64) -> Option<u8> {
    (1..=ITEMS_PER_PAGE as i64)
        .contains(&item_number)
        .then_some(item_number as u8)
}

/// Position the ledger assigns to the next event when the caller gives no
/// coordinates.
pub fn next_position(events: &[Event]) -> Position {
    resolve_position(events, None, None)
}

fn resolve_position(events: &[Event], page: Option<u32>, item_number: Option<u8>) -> Position {
    match (latest_numbered(events), page, item_number) {
        (_, Some(page), Some(item_number)) => Position::new(page, item_number),
        (Some(last), None, None) => last.next(),
        (Some(last), Some(page), None) => Position::new(page, last.next().item_number),
        (Some(last), None, Some(item_number)) => {
            // Only an explicit restart at item 1 after a full page moves on
            // to the next page.
            let page = if item_number == 1 && last.item_number >= ITEMS_PER_PAGE {
                last.page.saturating_add(1)
            } else {
                last.page
            };
            Position::new(page, item_number)
        }
        (None, page, item_number) => {
            let next = Position::from_ordinal(legacy_count(events));
            Position::new(
                page.unwrap_or(next.page),
                item_number.unwrap_or(next.item_number),
            )
        }
    }
}

/// Record a completion at `timestamp` (epoch milliseconds).
///
/// A page below 1 is raised to 1 and an item number outside 1..=10 counts as
/// not supplied; missing coordinates are assigned from the latest numbered
/// event. The first numbered event in a document that only has legacy events
/// also numbers those legacy events by their chronological position.
///
/// Returns the event as stored.
pub fn append(
    document: &mut Document,
    timestamp: i64,
    page: Option<i64>,
    item_number: Option<i64>,
) -> Event {
    document.events.sort_by_key(|e| e.timestamp);

    let page = page.map(clamp_page);
    let item_number = item_number.and_then(valid_item);
    let had_numbers_before = document.events.iter().any(Event::is_numbered);

    let position = resolve_position(&document.events, page, item_number);
    let event = Event::at(timestamp, position);

    if !had_numbers_before && !document.events.is_empty() {
        backfill_legacy(&mut document.events);
    }

    document.events.push(event);
    document.events.sort_by_key(|e| e.timestamp);

    *document.daily_progress.entry(event.utc_date()).or_insert(0) += 1;

    debug!(
        timestamp,
        page = position.page,
        item_number = position.item_number,
        "appended event"
    );
    event
}

/// Number every event by its index in timestamp order. Only called before the
/// first numbered event exists, when all events are legacy.
fn backfill_legacy(events: &mut [Event]) {
    for (index, event) in events.iter_mut().enumerate() {
        let position = Position::from_ordinal(index);
        event.page = Some(position.page);
        event.item_number = Some(position.item_number);
    }
    info!(count = events.len(), "numbered legacy events");
}

/// Negative targets are stored as 0.
pub fn set_total(document: &mut Document, total: i64) {
    document.total = u64::try_from(total).unwrap_or(0);
}

pub fn set_daily_goal(document: &mut Document, goal: i64) {
    document.daily_goal = goal;
}

/// Clear the target, events and daily progress. The daily goal is kept.
pub fn reset(document: &mut Document) {
    document.total = 0;
    document.events.clear();
    document.daily_progress.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MS_PER_DAY, utc_date};

    fn numbered(ts: i64, page: u32, item: u8) -> Event {
        Event::at(ts, Position::new(page, item))
    }

    fn document_with(events: Vec<Event>) -> Document {
        let mut doc = Document::default();
        for event in &events {
            *doc.daily_progress.entry(event.utc_date()).or_insert(0) += 1;
        }
        doc.events = events;
        doc
    }

    #[test]
    fn test_first_event_is_page_one_item_one() {
        let mut doc = Document::default();
        let event = append(&mut doc, 1_000, None, None);
        assert_eq!(event.position(), Some(Position::new(1, 1)));
    }

    #[test]
    fn test_wraps_after_item_ten() {
        let events = (1..=10).map(|i| numbered(i as i64, 1, i)).collect();
        let mut doc = document_with(events);

        assert_eq!(next_position(&doc.events), Position::new(2, 1));
        let event = append(&mut doc, 100, None, None);
        assert_eq!(event.position(), Some(Position::new(2, 1)));
    }

    #[test]
    fn test_continues_within_page() {
        let mut doc = document_with(vec![numbered(1, 4, 6)]);
        let event = append(&mut doc, 2, None, None);
        assert_eq!(event.position(), Some(Position::new(4, 7)));
    }

    #[test]
    fn test_next_position_follows_latest_timestamp_not_insertion_order() {
        let events = vec![numbered(500, 3, 2), numbered(100, 9, 9)];
        assert_eq!(next_position(&events), Position::new(3, 3));
    }

    #[test]
    fn test_next_position_from_legacy_count() {
        let events: Vec<Event> = (0..23).map(Event::legacy).collect();
        assert_eq!(next_position(&events), Position::new(3, 4));
    }

    #[test]
    fn test_explicit_item_one_after_full_page_advances_page() {
        let mut doc = document_with(vec![numbered(1, 2, 10)]);
        let event = append(&mut doc, 2, None, Some(1));
        assert_eq!(event.position(), Some(Position::new(3, 1)));
    }

    #[test]
    fn test_explicit_item_keeps_latest_page() {
        let mut doc = document_with(vec![numbered(1, 2, 10)]);
        let event = append(&mut doc, 2, None, Some(4));
        assert_eq!(event.position(), Some(Position::new(2, 4)));

        let mut doc = document_with(vec![numbered(1, 2, 5)]);
        let event = append(&mut doc, 2, None, Some(1));
        assert_eq!(event.position(), Some(Position::new(2, 1)));
    }

    #[test]
    fn test_explicit_page_fills_item() {
        let mut doc = document_with(vec![numbered(1, 2, 5)]);
        let event = append(&mut doc, 2, Some(7), None);
        assert_eq!(event.position(), Some(Position::new(7, 6)));
    }

    #[test]
    fn test_caller_values_are_clamped() {
        let mut doc = document_with(vec![numbered(1, 2, 5)]);
        let event = append(&mut doc, 2, Some(-3), Some(11));
        assert_eq!(event.position(), Some(Position::new(1, 6)));

        let event = append(&mut doc, 3, Some(0), Some(0));
        assert_eq!(event.position(), Some(Position::new(1, 7)));
    }

    #[test]
    fn test_events_stay_sorted_after_backdated_insert() {
        let mut doc = Document::default();
        for ts in [5_000, 1_000, 3_000, 2_000, 4_000] {
            append(&mut doc, ts, None, None);
        }

        let timestamps: Vec<i64> = doc.events.iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![1_000, 2_000, 3_000, 4_000, 5_000]);
    }

    #[test]
    fn test_one_time_backfill_of_legacy_events() {
        let legacy: Vec<Event> = (0..12).map(|i| Event::legacy(i * 1_000)).collect();
        let mut doc = document_with(legacy);

        let first = append(&mut doc, 100_000, None, None);
        assert_eq!(first.position(), Some(Position::new(2, 3)));
        assert_eq!(doc.events[0].position(), Some(Position::new(1, 1)));
        assert_eq!(doc.events[9].position(), Some(Position::new(1, 10)));
        assert_eq!(doc.events[10].position(), Some(Position::new(2, 1)));
        assert_eq!(doc.events[11].position(), Some(Position::new(2, 2)));

        // Later inserts never renumber.
        doc.events[0].page = Some(40);
        let second = append(&mut doc, 200_000, None, None);
        assert_eq!(second.position(), Some(Position::new(2, 4)));
        assert_eq!(doc.events[0].page, Some(40));
    }

    #[test]
    fn test_daily_progress_counts_each_utc_day() {
        let mut doc = Document::default();
        let day = 20_000 * MS_PER_DAY;
        for ts in [day, day + 10, day + MS_PER_DAY - 1, day + MS_PER_DAY] {
            append(&mut doc, ts, None, None);
        }

        assert_eq!(doc.progress_on(utc_date(day)), 3);
        assert_eq!(doc.progress_on(utc_date(day + MS_PER_DAY)), 1);
        assert_eq!(doc.daily_progress.values().sum::<u64>(), doc.completed());
        for event in &doc.events {
            let same_day = doc
                .events
                .iter()
                .filter(|e| e.utc_date() == event.utc_date())
                .count() as u64;
            assert_eq!(doc.progress_on(event.utc_date()), same_day);
        }
    }

    #[test]
    fn test_set_total_clamps_negative() {
        let mut doc = Document::default();
        set_total(&mut doc, -5);
        assert_eq!(doc.total, 0);
        set_total(&mut doc, 250);
        assert_eq!(doc.total, 250);
    }

    #[test]
    fn test_reset_preserves_goal() {
        let mut doc = Document::default();
        set_daily_goal(&mut doc, 25);
        set_total(&mut doc, 100);
        append(&mut doc, 1, None, None);

        reset(&mut doc);

        assert_eq!(doc.daily_goal, 25);
        assert_eq!(doc.total, 0);
        assert!(doc.events.is_empty());
        assert!(doc.daily_progress.is_empty());
    }
}
