use std::path::Path;

use agenda_core::ics::parse_events;
use anyhow::{Context, Result};
use tracing::info;

/// Convert an .ics file into a JSON event list on stdout.
pub fn run(path: &Path, calendar_id: &str) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let events = parse_events(&content, calendar_id)?;

    info!(count = events.len(), calendar = %calendar_id, "imported events");
    println!("{}", serde_json::to_string_pretty(&events)?);

    Ok(())
}
