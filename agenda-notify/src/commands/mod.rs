pub mod due;
pub mod expand;
pub mod export;
pub mod import;
pub mod run;

use std::path::{Path, PathBuf};

use agenda_core::EventDefinition;
use agenda_core::config::AgendaConfig;
use anyhow::{Context, Result};

/// Read a JSON event list from `path`, falling back to `events_file` in the
/// config.
pub fn load_events(path: Option<&Path>, config: &AgendaConfig) -> Result<Vec<EventDefinition>> {
    let path: PathBuf = match path {
        Some(path) => path.to_path_buf(),
        None => config.events_path().context(
            "No event list given.\n\n\
            Pass one with --events <file>, or set events_file in the config.",
        )?,
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid event list in {}", path.display()))
}
