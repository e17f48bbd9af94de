use agenda_core::EventDefinition;
use agenda_core::calendar::Calendar;
use agenda_core::ics::generate_ics;
use anyhow::Result;

/// Write events as an .ics document on stdout, optionally only one calendar's.
pub fn run(events: &[EventDefinition], calendar_id: Option<&str>) -> Result<()> {
    let selected: Vec<EventDefinition> = match calendar_id {
        Some(id) => Calendar::new(id, id).events(events).cloned().collect(),
        None => events.to_vec(),
    };

    if selected.is_empty() {
        anyhow::bail!("No events to export");
    }

    print!("{}", generate_ics(&selected)?);

    Ok(())
}
