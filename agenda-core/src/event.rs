//! Event definition types.
//!
//! These are the records the host application stores and pushes over the
//! sync channel. Dates and times stay textual so a single malformed record
//! still deserializes; the expander and the alert evaluator skip it instead
//! of rejecting the whole list.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::date_math::CalendarUnit;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A calendar event as stored by the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDefinition {
    pub id: String,
    pub calendar_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Anchor date (`YYYY-MM-DD`) of the first occurrence
    pub date: String,
    /// Wall-clock start (`HH:MM`), ignored for all-day events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default)]
    pub is_all_day: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RepeatRule>,
    #[serde(default)]
    pub alerts: Vec<AlertRule>,

    /// Shared by every occurrence of a recurring event
    #[serde(default)]
    pub is_completed: bool,
}

/// How a recurring event repeats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatRule {
    pub frequency: Frequency,
    pub interval: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// A reminder lead time before an event starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: String,
    /// Zero means "at event start"
    pub value: u32,
    pub unit: AlertUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl EventDefinition {
    /// Parse the anchor date, `None` when the record is malformed.
    pub fn anchor_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).ok()
    }

    /// Wall-clock start time. All-day events start at midnight.
    /// Timed events without a parsable time return `None`.
    pub fn start_time(&self) -> Option<NaiveTime> {
        if self.is_all_day {
            return Some(NaiveTime::MIN);
        }
        let raw = self.start_time.as_deref()?.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .ok()
    }

    /// Start instant when the event happens on `date`.
    pub fn starts_at(&self, date: NaiveDate) -> Option<NaiveDateTime> {
        self.start_time().map(|time| date.and_time(time))
    }

    pub fn is_recurring(&self) -> bool {
        self.repeat.is_some()
    }

    pub fn belongs_to(&self, calendar_id: &str) -> bool {
        self.calendar_id == calendar_id
    }
}

impl RepeatRule {
    pub fn new(frequency: Frequency, interval: u32) -> Self {
        RepeatRule {
            frequency,
            interval,
        }
    }

    /// The advance applied between two occurrences, `None` for interval 0.
    pub fn step(&self) -> Option<(CalendarUnit, i64)> {
        if self.interval == 0 {
            return None;
        }
        Some((self.frequency.unit(), i64::from(self.interval)))
    }
}

impl Frequency {
    pub fn unit(self) -> CalendarUnit {
        match self {
            Frequency::Daily => CalendarUnit::Days,
            Frequency::Weekly => CalendarUnit::Weeks,
            Frequency::Monthly => CalendarUnit::Months,
            Frequency::Yearly => CalendarUnit::Years,
        }
    }

    pub fn as_rrule_str(self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }

    pub fn from_rrule_str(s: &str) -> Option<Self> {
        match s {
            "DAILY" => Some(Frequency::Daily),
            "WEEKLY" => Some(Frequency::Weekly),
            "MONTHLY" => Some(Frequency::Monthly),
            "YEARLY" => Some(Frequency::Yearly),
            _ => None,
        }
    }
}

impl AlertUnit {
    pub fn unit(self) -> CalendarUnit {
        match self {
            AlertUnit::Minutes => CalendarUnit::Minutes,
            AlertUnit::Hours => CalendarUnit::Hours,
            AlertUnit::Days => CalendarUnit::Days,
            AlertUnit::Weeks => CalendarUnit::Weeks,
            AlertUnit::Months => CalendarUnit::Months,
            AlertUnit::Years => CalendarUnit::Years,
        }
    }

    /// Human label, singular for a value of one.
    pub fn label(self, value: u32) -> &'static str {
        let one = value == 1;
        match self {
            AlertUnit::Minutes if one => "minute",
            AlertUnit::Minutes => "minutes",
            AlertUnit::Hours if one => "hour",
            AlertUnit::Hours => "hours",
            AlertUnit::Days if one => "day",
            AlertUnit::Days => "days",
            AlertUnit::Weeks if one => "week",
            AlertUnit::Weeks => "weeks",
            AlertUnit::Months if one => "month",
            AlertUnit::Months => "months",
            AlertUnit::Years if one => "year",
            AlertUnit::Years => "years",
        }
    }
}

/// Format a date the way event records store it.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
