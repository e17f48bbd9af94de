//! ICS import using the icalendar crate's parser.

use chrono::NaiveDateTime;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, read_calendar, unfold},
};
use tracing::debug;

use crate::error::{AgendaError, AgendaResult};
use crate::event::{AlertRule, AlertUnit, EventDefinition, Frequency, RepeatRule, format_date};

/// Parse every VEVENT in `content` into an event definition owned by
/// `calendar_id`. VEVENTs without a usable DTSTART are skipped.
pub fn parse_events(content: &str, calendar_id: &str) -> AgendaResult<Vec<EventDefinition>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| AgendaError::IcsParse(e.to_string()))?;

    Ok(calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .filter_map(|vevent| parse_vevent(vevent, calendar_id))
        .collect())
}

fn parse_vevent(vevent: &Component, calendar_id: &str) -> Option<EventDefinition> {
    let id = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let Some(start) = vevent
        .find_prop("DTSTART")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
    else {
        debug!(uid = %id, "skipping VEVENT without a usable DTSTART");
        return None;
    };

    let (date, start_time, is_all_day) = match start {
        DatePerhapsTime::Date(d) => (d, None, true),
        DatePerhapsTime::DateTime(cal_dt) => {
            let local = wall_clock(cal_dt);
            (local.date(), Some(local.format("%H:%M").to_string()), false)
        }
    };

    let title = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| "(No title)".to_string());
    let description = vevent.find_prop("DESCRIPTION").map(|p| p.val.to_string());
    let category = vevent.find_prop("CATEGORIES").map(|p| p.val.to_string());

    let repeat = vevent
        .find_prop("RRULE")
        .and_then(|p| parse_rrule(p.val.as_ref()));

    let is_completed = vevent
        .find_prop("X-AGENDA-COMPLETED")
        .is_some_and(|p| p.val.as_ref().eq_ignore_ascii_case("TRUE"));

    let alerts: Vec<AlertRule> = vevent
        .components
        .iter()
        .filter(|c| c.name == "VALARM")
        .enumerate()
        .filter_map(|(index, alarm)| {
            let trigger = alarm.find_prop("TRIGGER")?.val.as_ref();
            let (value, unit) = parse_trigger(trigger)?;
            let alert_id = alarm
                .find_prop("X-ALERT-ID")
                .map(|p| p.val.to_string())
                .unwrap_or_else(|| format!("alarm-{}", index + 1));
            Some(AlertRule {
                id: alert_id,
                value,
                unit,
            })
        })
        .collect();

    Some(EventDefinition {
        id,
        calendar_id: calendar_id.to_string(),
        title,
        description,
        category,
        date: format_date(date),
        start_time,
        is_all_day,
        repeat,
        alerts,
        is_completed,
    })
}

/// Scheduling is wall-clock only, so zoned and UTC stamps keep their
/// written digits.
fn wall_clock(cal_dt: CalendarDateTime) -> NaiveDateTime {
    match cal_dt {
        CalendarDateTime::Floating(naive) => naive,
        CalendarDateTime::Utc(dt) => dt.naive_utc(),
        CalendarDateTime::WithTimezone { date_time, .. } => date_time,
    }
}

/// Parse `FREQ=WEEKLY;INTERVAL=2`. Parts other than FREQ and INTERVAL are
/// dropped.
fn parse_rrule(rrule: &str) -> Option<RepeatRule> {
    let mut frequency = None;
    let mut interval = 1;

    for part in rrule.split(';') {
        match part.split_once('=') {
            Some(("FREQ", value)) => frequency = Frequency::from_rrule_str(value),
            Some(("INTERVAL", value)) => interval = value.parse().ok()?,
            Some((key, _)) => debug!(rrule, key, "dropping unsupported RRULE part"),
            None => {}
        }
    }

    frequency.map(|frequency| RepeatRule::new(frequency, interval))
}

/// Parse a TRIGGER such as `-PT15M` or `-P1D` into a lead time.
/// Triggers after the start and mixed-unit durations are not representable.
fn parse_trigger(value: &str) -> Option<(u32, AlertUnit)> {
    let duration_str = value.strip_prefix('-').unwrap_or(value);
    let is_before = value.starts_with('-');

    let lead = match iso8601::duration(duration_str).ok()? {
        iso8601::Duration::Weeks(w) => (w, AlertUnit::Weeks),
        iso8601::Duration::YMDHMS {
            year,
            month,
            day,
            hour,
            minute,
            second,
            millisecond,
        } => {
            if second != 0 || millisecond != 0 {
                return None;
            }
            let parts = [
                (year, AlertUnit::Years),
                (month, AlertUnit::Months),
                (day, AlertUnit::Days),
                (hour, AlertUnit::Hours),
                (minute, AlertUnit::Minutes),
            ];
            let mut non_zero = parts.iter().filter(|(amount, _)| *amount != 0);
            match (non_zero.next(), non_zero.next()) {
                (None, _) => (0, AlertUnit::Minutes),
                (Some(&(amount, unit)), None) => (amount, unit),
                (Some(_), Some(_)) => {
                    // Mixed units collapse to minutes when they have a fixed length
                    if year != 0 || month != 0 {
                        return None;
                    }
                    let minutes = day
                        .checked_mul(24)
                        .and_then(|hours| hours.checked_add(hour))
                        .and_then(|hours| hours.checked_mul(60))
                        .and_then(|minutes| minutes.checked_add(minute))?;
                    (minutes, AlertUnit::Minutes)
                }
            }
        }
    };

    if !is_before && lead.0 != 0 {
        return None;
    }
    Some(lead)
}
