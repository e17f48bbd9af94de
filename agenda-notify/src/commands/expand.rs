use agenda_core::EventDefinition;
use agenda_core::date_range::DateRange;
use agenda_core::recurrence::Occurrence;
use anyhow::Result;

pub fn run(events: &[EventDefinition], range: DateRange) -> Result<()> {
    let occurrences = sorted_occurrences(events, range);
    let mut remaining = occurrences.as_slice();

    for (index, day) in range.days().enumerate() {
        if index > 0 {
            println!();
        }
        println!("{}", day.format("%a %b %-d %Y"));

        let count = remaining.iter().take_while(|o| o.date == day).count();
        let (on_day, rest) = remaining.split_at(count);
        if on_day.is_empty() {
            println!("  No events");
        }
        for occurrence in on_day {
            println!("  {}", format_line(occurrence));
        }
        remaining = rest;
    }

    Ok(())
}

/// Occurrences in `range`, by date then start time. All-day events come first.
fn sorted_occurrences(events: &[EventDefinition], range: DateRange) -> Vec<Occurrence> {
    let mut occurrences = range.occurrences(events);
    occurrences.sort_by_key(|o| (o.date, !o.event.is_all_day, o.starts_at()));
    occurrences
}

fn format_line(occurrence: &Occurrence) -> String {
    let event = &occurrence.event;
    let time = if event.is_all_day {
        "all-day".to_string()
    } else {
        match event.start_time() {
            Some(time) => format!("{:>7}", time.format("%H:%M")),
            None => format!("{:>7}", "?"),
        }
    };
    let done = if event.is_completed { " (done)" } else { "" };
    format!("{} {}{} [{}]", time, event.title, done, event.calendar_id)
}
