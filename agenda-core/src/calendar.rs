//! Calendars that own events.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::event::EventDefinition;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Calendar {
    pub fn new(id: &str, name: &str) -> Self {
        Calendar {
            id: id.to_string(),
            name: name.to_string(),
            color: None,
        }
    }

    /// Events owned by this calendar.
    pub fn events<'a>(
        &'a self,
        events: &'a [EventDefinition],
    ) -> impl Iterator<Item = &'a EventDefinition> + 'a {
        events.iter().filter(|e| e.belongs_to(&self.id))
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Drop every event owned by `calendar_id`, returning how many were removed.
/// Deleting a calendar always goes through here so no orphans remain.
pub fn cascade_delete(calendar_id: &str, events: &mut Vec<EventDefinition>) -> usize {
    let before = events.len();
    events.retain(|e| !e.belongs_to(calendar_id));
    before - events.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, calendar_id: &str) -> EventDefinition {
        EventDefinition {
            id: id.to_string(),
            calendar_id: calendar_id.to_string(),
            title: String::new(),
            description: None,
            category: None,
            date: "2024-01-01".to_string(),
            start_time: None,
            is_all_day: true,
            repeat: None,
            alerts: vec![],
            is_completed: false,
        }
    }

    #[test]
    fn test_cascade_delete_removes_only_owned_events() {
        let mut events = vec![event("1", "work"), event("2", "home"), event("3", "work")];

        let removed = cascade_delete("work", &mut events);

        assert_eq!(removed, 2);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "2");
    }

    #[test]
    fn test_calendar_events_filter() {
        let events = vec![event("1", "work"), event("2", "home")];
        let work = Calendar::new("work", "Work");

        let ids: Vec<&str> = work.events(&events).map(|e| e.id.as_str()).collect();

        assert_eq!(ids, vec!["1"]);
        assert_eq!(work.to_string(), "Work");
    }
}
