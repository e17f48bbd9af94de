//! Viewing windows for the day, week and month views.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::event::EventDefinition;
use crate::recurrence::{Occurrence, expand};

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, `None` when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(DateRange { start, end })
    }

    pub fn day(date: NaiveDate) -> Self {
        DateRange {
            start: date,
            end: date,
        }
    }

    /// The seven days containing `date`, starting on `week_start`.
    pub fn week(date: NaiveDate, week_start: Weekday) -> Self {
        let start = start_of_week(date, week_start);
        DateRange {
            start,
            end: start + Days::new(6),
        }
    }

    /// Whole weeks covering the month of `date`, as drawn by a month grid.
    pub fn month_grid(date: NaiveDate, week_start: Weekday) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        let last = last_day_of_month(date);
        DateRange {
            start: start_of_week(first, week_start),
            end: start_of_week(last, week_start) + Days::new(6),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(|d| *d <= self.end)
    }

    /// Occurrences of `events` within this range.
    pub fn occurrences(&self, events: &[EventDefinition]) -> Vec<Occurrence> {
        expand(events, self.start, self.end)
    }
}

fn start_of_week(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let offset =
        (7 + date.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    date - Days::new(u64::from(offset))
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_starting_sunday_and_monday() {
        // 2024-05-15 is a Wednesday
        let sunday = DateRange::week(date(2024, 5, 15), Weekday::Sun);
        let monday = DateRange::week(date(2024, 5, 15), Weekday::Mon);

        assert_eq!((sunday.start, sunday.end), (date(2024, 5, 12), date(2024, 5, 18)));
        assert_eq!((monday.start, monday.end), (date(2024, 5, 13), date(2024, 5, 19)));
    }

    #[test]
    fn test_week_on_its_first_day() {
        let range = DateRange::week(date(2024, 5, 12), Weekday::Sun);
        assert_eq!(range.start, date(2024, 5, 12));
    }

    #[test]
    fn test_month_grid_covers_whole_weeks() {
        // February 2024 starts on a Thursday and ends on a Thursday
        let grid = DateRange::month_grid(date(2024, 2, 10), Weekday::Sun);

        assert_eq!(grid.start, date(2024, 1, 28));
        assert_eq!(grid.end, date(2024, 3, 2));
        assert_eq!(grid.days().count(), 35);
    }

    #[test]
    fn test_month_grid_in_december() {
        let grid = DateRange::month_grid(date(2024, 12, 25), Weekday::Mon);

        assert_eq!(grid.start, date(2024, 11, 25));
        assert_eq!(grid.end, date(2025, 1, 5));
        assert!(grid.contains(date(2024, 12, 31)));
    }

    #[test]
    fn test_new_rejects_reversed_bounds() {
        assert!(DateRange::new(date(2024, 1, 2), date(2024, 1, 1)).is_none());
        assert!(DateRange::new(date(2024, 1, 1), date(2024, 1, 1)).is_some());
    }
}
