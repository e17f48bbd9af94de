//! Unit-keyed calendar arithmetic.
//!
//! Repeat frequencies and alert lead times both resolve to a `CalendarUnit`,
//! and each unit maps to one pure shift function. Month and year shifts keep
//! the day of month and let overflow spill into the following month, so
//! 31 Jan + 1 month lands on 2 or 3 Mar depending on the year.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

type ShiftFn = fn(NaiveDateTime, i64) -> Option<NaiveDateTime>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl CalendarUnit {
    fn shift_fn(self) -> ShiftFn {
        match self {
            CalendarUnit::Minutes => shift_minutes,
            CalendarUnit::Hours => shift_hours,
            CalendarUnit::Days => shift_days,
            CalendarUnit::Weeks => shift_weeks,
            CalendarUnit::Months => shift_months,
            CalendarUnit::Years => shift_years,
        }
    }

    /// Move `at` by `amount` units (negative moves backwards).
    /// Returns `None` if the result is out of chrono's range.
    pub fn shift(self, at: NaiveDateTime, amount: i64) -> Option<NaiveDateTime> {
        (self.shift_fn())(at, amount)
    }

    pub fn shift_date(self, date: NaiveDate, amount: i64) -> Option<NaiveDate> {
        self.shift(date.and_time(NaiveTime::MIN), amount)
            .map(|dt| dt.date())
    }

    /// Length in days when the unit has a fixed calendar length.
    pub fn fixed_days(self) -> Option<i64> {
        match self {
            CalendarUnit::Days => Some(1),
            CalendarUnit::Weeks => Some(7),
            _ => None,
        }
    }
}

fn shift_minutes(at: NaiveDateTime, amount: i64) -> Option<NaiveDateTime> {
    at.checked_add_signed(TimeDelta::try_minutes(amount)?)
}

fn shift_hours(at: NaiveDateTime, amount: i64) -> Option<NaiveDateTime> {
    at.checked_add_signed(TimeDelta::try_hours(amount)?)
}

// Wall-clock time has no DST gaps, so a calendar day is always 24h here.
fn shift_days(at: NaiveDateTime, amount: i64) -> Option<NaiveDateTime> {
    at.checked_add_signed(TimeDelta::try_days(amount)?)
}

fn shift_weeks(at: NaiveDateTime, amount: i64) -> Option<NaiveDateTime> {
    shift_days(at, amount.checked_mul(7)?)
}

fn shift_months(at: NaiveDateTime, amount: i64) -> Option<NaiveDateTime> {
    let total = i64::from(at.year())
        .checked_mul(12)?
        .checked_add(i64::from(at.month0()))?
        .checked_add(amount)?;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month0 = u32::try_from(total.rem_euclid(12)).ok()?;

    let first = NaiveDate::from_ymd_opt(year, month0 + 1, 1)?;
    let date = first.checked_add_days(Days::new(u64::from(at.day0())))?;
    Some(date.and_time(at.time()))
}

fn shift_years(at: NaiveDateTime, amount: i64) -> Option<NaiveDateTime> {
    shift_months(at, amount.checked_mul(12)?)
}
