use agenda_core::EventDefinition;
use agenda_core::alert::{AlertFireEvent, scan_event};
use anyhow::Result;
use chrono::NaiveDateTime;
use tracing::warn;

pub fn run(events: &[EventDefinition], at: NaiveDateTime) -> Result<()> {
    let due = due_at(events, at);

    if due.is_empty() {
        println!("Nothing due at {}", at.format("%Y-%m-%d %H:%M"));
        return Ok(());
    }

    for fire in &due {
        println!("{}  {}: {}", fire.tag, fire.title, fire.body);
    }

    Ok(())
}

/// Everything a tick at `at` would deliver. Events that fail to scan are
/// logged and skipped.
fn due_at(events: &[EventDefinition], at: NaiveDateTime) -> Vec<AlertFireEvent> {
    events
        .iter()
        .flat_map(|event| match scan_event(event, at) {
            Ok(due) => due,
            Err(e) => {
                warn!(event_id = %event.id, error = %e, "skipping event");
                Vec::new()
            }
        })
        .collect()
}
