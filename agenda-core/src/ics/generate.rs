//! ICS export.

use icalendar::{Alarm, Calendar, Component, EventLike, Property, Trigger, ValueType};

use crate::error::{AgendaError, AgendaResult};
use crate::event::{AlertRule, AlertUnit, EventDefinition};

/// Generate one VCALENDAR holding a VEVENT per event definition.
///
/// Fails on the first definition whose date or start time is malformed.
pub fn generate_ics(events: &[EventDefinition]) -> AgendaResult<String> {
    let mut cal = Calendar::new();

    for event in events {
        cal.push(to_ics_event(event)?);
    }

    let cal = cal.done();

    Ok(strip_ics_bloat(&cal.to_string()))
}

fn to_ics_event(event: &EventDefinition) -> AgendaResult<icalendar::Event> {
    let date = event.anchor_date().ok_or_else(|| {
        AgendaError::IcsGenerate(format!("Event '{}' has invalid date '{}'", event.id, event.date))
    })?;

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event.id);
    ics_event.summary(&event.title);

    if event.is_all_day {
        let mut prop = Property::new("DTSTART", date.format("%Y%m%d").to_string());
        prop.append_parameter(ValueType::Date);
        ics_event.append_property(prop);
    } else {
        let starts_at = event.starts_at(date).ok_or_else(|| {
            AgendaError::IcsGenerate(format!("Event '{}' has no valid start time", event.id))
        })?;
        // Floating local time, no TZID
        ics_event.add_property("DTSTART", starts_at.format("%Y%m%dT%H%M%S").to_string());
    }

    if let Some(ref desc) = event.description {
        ics_event.description(desc);
    }

    if let Some(ref category) = event.category {
        ics_event.add_property("CATEGORIES", category);
    }

    if let Some(ref repeat) = event.repeat {
        ics_event.add_property(
            "RRULE",
            format!("FREQ={};INTERVAL={}", repeat.frequency.as_rrule_str(), repeat.interval),
        );
    }

    if event.is_completed {
        ics_event.add_property("X-AGENDA-COMPLETED", "TRUE");
    }

    for alert in &event.alerts {
        ics_event.alarm(to_alarm(alert, &event.title));
    }

    Ok(ics_event.done())
}

fn to_alarm(alert: &AlertRule, title: &str) -> Alarm {
    let mut alarm = Alarm::display(title, Trigger::before_start(chrono::Duration::zero()));
    // Months and years have no fixed length, so the trigger is written as an
    // ISO 8601 duration string rather than built from a chrono::Duration.
    alarm.add_property("TRIGGER", trigger_value(alert));
    alarm.add_property("X-ALERT-ID", &alert.id);
    alarm.done()
}

/// `-PT15M`, `-PT2H`, `-P1D`, `-P2W`, `-P1M`, `-P1Y`
pub(crate) fn trigger_value(alert: &AlertRule) -> String {
    let value = alert.value;
    match alert.unit {
        AlertUnit::Minutes => format!("-PT{value}M"),
        AlertUnit::Hours => format!("-PT{value}H"),
        AlertUnit::Days => format!("-P{value}D"),
        AlertUnit::Weeks => format!("-P{value}W"),
        AlertUnit::Months => format!("-P{value}M"),
        AlertUnit::Years => format!("-P{value}Y"),
    }
}

/// Normalize icalendar's output: our own PRODID, no default CALSCALE, and no
/// DTSTAMP or UID on alarms.
fn strip_ics_bloat(ics: &str) -> String {
    let mut in_valarm = false;
    let mut out = String::with_capacity(ics.len());

    for line in ics.lines() {
        match line {
            "CALSCALE:GREGORIAN" => continue,
            "BEGIN:VALARM" => in_valarm = true,
            "END:VALARM" => in_valarm = false,
            _ => {}
        }

        let keep = if line.starts_with("PRODID:") {
            "PRODID:AGENDA"
        } else if in_valarm && (line.starts_with("DTSTAMP:") || line.starts_with("UID:")) {
            continue;
        } else {
            line
        };
        out.push_str(keep);
        out.push_str("\r\n");
    }

    out
}
