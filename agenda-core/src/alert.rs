//! Reminder due-checks.
//!
//! An alert is due when its notification instant (event start minus the lead
//! time) falls in the half-open minute `(now - 60s, now]`. The scheduler ticks
//! once per minute, so each alert fires at most once per occurrence as long as
//! ticks are not delayed by more than the window width.

use chrono::{Days, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{AgendaError, AgendaResult};
use crate::event::{AlertRule, EventDefinition};
use crate::recurrence::{Occurrence, expand_event};

/// Width of the due window in milliseconds.
pub const DUE_WINDOW_MS: i64 = 60_000;

/// Scheduler polling period. Must equal the due window width.
pub const TICK_PERIOD: std::time::Duration = std::time::Duration::from_millis(DUE_WINDOW_MS as u64);

// Month and year rollover can push an occurrence up to three days past the
// plain forward shift of `now`.
const ROLLOVER_SLACK_DAYS: u64 = 3;

/// A reminder that must be delivered now
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertFireEvent {
    /// `{eventId}-{alertId}`, shared by every occurrence of the event
    pub tag: String,
    pub title: String,
    pub body: String,
    pub event_id: String,
    pub alert_id: String,
    pub starts_at: NaiveDateTime,
}

/// Notification tag for an alert rule of an event.
pub fn alert_tag(event_id: &str, alert_id: &str) -> String {
    format!("{}-{}", event_id, alert_id)
}

/// The alerts of `occurrence` that are due at `now`.
///
/// Completed, all-day and alert-less events never produce anything, neither
/// do occurrences without a usable start instant.
pub fn due_alerts(occurrence: &Occurrence, now: NaiveDateTime) -> Vec<AlertFireEvent> {
    let event = &occurrence.event;
    if event.alerts.is_empty() || event.is_completed || event.is_all_day {
        return Vec::new();
    }

    let Some(starts_at) = occurrence.starts_at() else {
        return Vec::new();
    };

    event
        .alerts
        .iter()
        .filter(|alert| is_due(alert, starts_at, now))
        .map(|alert| AlertFireEvent {
            tag: alert_tag(&event.id, &alert.id),
            title: event.title.clone(),
            body: alert_body(alert, starts_at),
            event_id: event.id.clone(),
            alert_id: alert.id.clone(),
            starts_at,
        })
        .collect()
}

/// When an alert's notification should appear for an event starting at `starts_at`.
pub fn notification_instant(alert: &AlertRule, starts_at: NaiveDateTime) -> Option<NaiveDateTime> {
    alert.unit.unit().shift(starts_at, -i64::from(alert.value))
}

fn is_due(alert: &AlertRule, starts_at: NaiveDateTime, now: NaiveDateTime) -> bool {
    let Some(fire_at) = notification_instant(alert, starts_at) else {
        return false;
    };
    let elapsed = now.signed_duration_since(fire_at).num_milliseconds();
    (0..DUE_WINDOW_MS).contains(&elapsed)
}

fn alert_body(alert: &AlertRule, starts_at: NaiveDateTime) -> String {
    let time = starts_at.format("%H:%M");
    if alert.value == 0 {
        format!("Starting now ({})", time)
    } else {
        format!(
            "Starts in {} {} ({})",
            alert.value,
            alert.unit.label(alert.value),
            time
        )
    }
}

/// All alerts of `event` due at `now`, across every occurrence that could
/// have one.
///
/// Non-recurring events are checked as they are. Recurring events are
/// expanded over the span their longest lead time can reach from `now`.
/// Malformed dates or times are reported as errors so the caller can log the
/// offending record and move on.
pub fn scan_event(event: &EventDefinition, now: NaiveDateTime) -> AgendaResult<Vec<AlertFireEvent>> {
    if event.alerts.is_empty() || event.is_completed || event.is_all_day {
        return Ok(Vec::new());
    }

    let anchor = event.anchor_date().ok_or_else(|| AgendaError::InvalidDate {
        event_id: event.id.clone(),
        value: event.date.clone(),
    })?;

    if event.start_time().is_none() {
        return Err(AgendaError::InvalidTime {
            event_id: event.id.clone(),
            value: event.start_time.clone().unwrap_or_default(),
        });
    }

    if !event.is_recurring() {
        return Ok(Occurrence::single(event)
            .map(|occurrence| due_alerts(&occurrence, now))
            .unwrap_or_default());
    }

    let today = now.date();
    let reach = event
        .alerts
        .iter()
        .filter_map(|alert| alert.unit.unit().shift(now, i64::from(alert.value)))
        .max()
        .ok_or_else(|| AgendaError::DateOutOfRange(event.id.clone()))?;

    let window_start = today.checked_sub_days(Days::new(1)).unwrap_or(today).max(anchor);
    let window_end = reach
        .date()
        .checked_add_days(Days::new(ROLLOVER_SLACK_DAYS))
        .ok_or_else(|| AgendaError::DateOutOfRange(event.id.clone()))?;

    if window_start > window_end {
        return Ok(Vec::new());
    }

    Ok(expand_event(event, window_start, window_end)
        .iter()
        .flat_map(|occurrence| due_alerts(occurrence, now))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{AlertUnit, Frequency, RepeatRule};
    use chrono::{NaiveDate, TimeDelta};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn alert(id: &str, value: u32, unit: AlertUnit) -> AlertRule {
        AlertRule {
            id: id.to_string(),
            value,
            unit,
        }
    }

    fn event(date: &str, time: &str, alerts: Vec<AlertRule>) -> EventDefinition {
        EventDefinition {
            id: "evt".to_string(),
            calendar_id: "personal".to_string(),
            title: "Dentist".to_string(),
            description: None,
            category: None,
            date: date.to_string(),
            start_time: Some(time.to_string()),
            is_all_day: false,
            repeat: None,
            alerts,
            is_completed: false,
        }
    }

    fn occurrence(event: &EventDefinition) -> Occurrence {
        Occurrence::single(event).unwrap()
    }

    #[test]
    fn test_due_window_boundaries() {
        let event = event("2024-06-01", "10:00", vec![alert("a", 15, AlertUnit::Minutes)]);
        let occurrence = occurrence(&event);
        let fire_at = at(2024, 6, 1, 9, 45);

        let due_after = |ms: i64| !due_alerts(&occurrence, fire_at + TimeDelta::milliseconds(ms)).is_empty();

        assert!(due_after(0));
        assert!(due_after(59_999));
        assert!(!due_after(-1));
        assert!(!due_after(60_000));
    }

    #[test]
    fn test_fire_event_shape() {
        let event = event("2024-06-01", "10:00", vec![alert("a", 1, AlertUnit::Hours)]);

        let fired = due_alerts(&occurrence(&event), at(2024, 6, 1, 9, 0));

        assert_eq!(
            fired,
            vec![AlertFireEvent {
                tag: "evt-a".to_string(),
                title: "Dentist".to_string(),
                body: "Starts in 1 hour (10:00)".to_string(),
                event_id: "evt".to_string(),
                alert_id: "a".to_string(),
                starts_at: at(2024, 6, 1, 10, 0),
            }]
        );
    }

    #[test]
    fn test_zero_value_alert_says_starting_now() {
        let event = event("2024-06-01", "10:00", vec![alert("now", 0, AlertUnit::Minutes)]);

        let fired = due_alerts(&occurrence(&event), at(2024, 6, 1, 10, 0));

        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].body, "Starting now (10:00)");
        assert!(!fired[0].body.contains("0 minutes"));
    }

    #[test]
    fn test_completed_event_is_suppressed() {
        let mut event = event("2024-06-01", "10:00", vec![alert("a", 15, AlertUnit::Minutes)]);
        event.is_completed = true;

        assert!(due_alerts(&occurrence(&event), at(2024, 6, 1, 9, 45)).is_empty());
        assert!(scan_event(&event, at(2024, 6, 1, 9, 45)).unwrap().is_empty());
    }

    #[test]
    fn test_all_day_event_is_suppressed() {
        let mut event = event("2024-06-01", "00:00", vec![alert("a", 0, AlertUnit::Minutes)]);
        event.is_all_day = true;

        assert!(due_alerts(&occurrence(&event), at(2024, 6, 1, 0, 0)).is_empty());
    }

    #[test]
    fn test_only_matching_alerts_fire() {
        let event = event(
            "2024-06-03",
            "08:30",
            vec![
                alert("day", 2, AlertUnit::Days),
                alert("week", 1, AlertUnit::Weeks),
                alert("min", 5, AlertUnit::Minutes),
            ],
        );

        let fired = due_alerts(&occurrence(&event), at(2024, 6, 1, 8, 30));

        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].tag, "evt-day");
        assert_eq!(fired[0].body, "Starts in 2 days (08:30)");
    }

    #[test]
    fn test_month_lead_inherits_rollover() {
        // 31 Mar - 1 month rolls to 2 Mar in 2024
        let event = event("2024-03-31", "12:00", vec![alert("m", 1, AlertUnit::Months)]);

        assert_eq!(due_alerts(&occurrence(&event), at(2024, 3, 2, 12, 0)).len(), 1);
        assert!(due_alerts(&occurrence(&event), at(2024, 2, 29, 12, 0)).is_empty());
    }

    #[test]
    fn test_scan_recurring_event_finds_todays_occurrence() {
        let mut event = event("2024-01-01", "09:00", vec![alert("a", 10, AlertUnit::Minutes)]);
        event.repeat = Some(RepeatRule::new(Frequency::Daily, 1));

        let fired = scan_event(&event, at(2024, 5, 20, 8, 50)).unwrap();

        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].tag, "evt-a");
        assert_eq!(fired[0].starts_at, at(2024, 5, 20, 9, 0));
    }

    #[test]
    fn test_scan_recurring_event_with_day_lead_reaches_future_occurrence() {
        let mut event = event("2024-01-01", "09:00", vec![alert("a", 3, AlertUnit::Days)]);
        event.repeat = Some(RepeatRule::new(Frequency::Weekly, 1));

        // 2024-05-20 is a Monday; the Monday occurrence is three days after Friday
        let fired = scan_event(&event, at(2024, 5, 17, 9, 0)).unwrap();

        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].starts_at, at(2024, 5, 20, 9, 0));
        assert!(scan_event(&event, at(2024, 5, 18, 9, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_scan_reports_malformed_records() {
        let bad_date = event("2024-02-30", "09:00", vec![alert("a", 0, AlertUnit::Minutes)]);
        let bad_time = event("2024-02-01", "9h", vec![alert("a", 0, AlertUnit::Minutes)]);
        let now = at(2024, 2, 1, 9, 0);

        assert!(matches!(scan_event(&bad_date, now), Err(AgendaError::InvalidDate { .. })));
        assert!(matches!(scan_event(&bad_time, now), Err(AgendaError::InvalidTime { .. })));
        assert!(due_alerts(&Occurrence::single(&bad_time).unwrap(), now).is_empty());
    }
}
