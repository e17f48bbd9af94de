//! Repeat-rule expansion.
//!
//! Projects event definitions onto the concrete dates inside a viewing
//! window. Occurrences are disposable: they are rebuilt on every call and
//! never stored.

use chrono::{NaiveDate, NaiveDateTime};

use crate::date_math::CalendarUnit;
use crate::date_range::DateRange;
use crate::event::{EventDefinition, format_date};

/// One dated materialization of an event definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Event id for single events, `{eventId}_{YYYY-MM-DD}` for recurring ones
    pub id: String,
    pub date: NaiveDate,
    /// Clone of the source definition with `date` set to the occurrence date.
    /// `event.id` keeps the source id.
    pub event: EventDefinition,
}

impl Occurrence {
    /// The occurrence of a non-recurring event, `None` if its date is malformed.
    pub fn single(event: &EventDefinition) -> Option<Self> {
        let date = event.anchor_date()?;
        Some(Occurrence {
            id: event.id.clone(),
            date,
            event: event.clone(),
        })
    }

    fn recurring(event: &EventDefinition, date: NaiveDate) -> Self {
        let mut event = event.clone();
        event.date = format_date(date);
        Occurrence {
            id: occurrence_id(&event.id, date),
            date,
            event,
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event.id
    }

    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        self.event.starts_at(self.date)
    }
}

/// Stable id of a recurring event's occurrence on `date`.
pub fn occurrence_id(event_id: &str, date: NaiveDate) -> String {
    format!("{}_{}", event_id, format_date(date))
}

/// Expand events into occurrences within `[window_start, window_end]`.
///
/// Both bounds are inclusive and `window_start <= window_end` is expected.
/// Records with an unparsable anchor date produce nothing. Output order is
/// unspecified.
pub fn expand(
    events: &[EventDefinition],
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<Occurrence> {
    events
        .iter()
        .flat_map(|event| expand_event(event, window_start, window_end))
        .collect()
}

/// Expand a single event into its occurrences within the window.
pub fn expand_event(
    event: &EventDefinition,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<Occurrence> {
    let Some(anchor) = event.anchor_date() else {
        return Vec::new();
    };

    let window = DateRange {
        start: window_start,
        end: window_end,
    };

    let Some(repeat) = &event.repeat else {
        return Occurrence::single(event)
            .filter(|_| window.contains(anchor))
            .into_iter()
            .collect();
    };

    let Some((unit, amount)) = repeat.step() else {
        return Vec::new();
    };

    let mut cursor = anchor;

    // Fixed-length steps can jump straight to the last step before the window.
    if let Some(days_per_unit) = unit.fixed_days() {
        if cursor < window_start {
            let step_days = days_per_unit * amount;
            let skipped = (window_start - cursor).num_days() / step_days;
            if let Some(jumped) = CalendarUnit::Days.shift_date(cursor, skipped * step_days) {
                cursor = jumped;
            }
        }
    }

    let mut occurrences = Vec::new();
    while cursor <= window_end {
        if cursor >= window_start {
            occurrences.push(Occurrence::recurring(event, cursor));
        }
        match unit.shift_date(cursor, amount) {
            Some(next) if next > cursor => cursor = next,
            _ => break,
        }
    }

    occurrences
}
