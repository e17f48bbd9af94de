//! Agenda configuration.

use std::path::{Path, PathBuf};

use chrono::{TimeDelta, Weekday};
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{AgendaError, AgendaResult};
use crate::notification::DEFAULT_MAX_SNOOZES;

static DEFAULT_SNOOZE_DELAY: &str = "5m";
static DEFAULT_APP_NAME: &str = "agenda";

fn default_snooze_delay() -> String {
    DEFAULT_SNOOZE_DELAY.to_string()
}

fn default_max_snoozes() -> u32 {
    DEFAULT_MAX_SNOOZES
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    pub fn weekday(self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        }
    }
}

/// Configuration at ~/.config/agenda/config.toml
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AgendaConfig {
    /// How long a snoozed reminder waits, e.g. "5m"
    #[serde(default = "default_snooze_delay")]
    pub snooze_delay: String,

    #[serde(default = "default_max_snoozes")]
    pub max_snoozes: u32,

    /// Application name shown on desktop notifications
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default)]
    pub week_start: WeekStart,

    /// JSON event list used by the inspection commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_file: Option<PathBuf>,
}

impl Default for AgendaConfig {
    fn default() -> Self {
        AgendaConfig {
            snooze_delay: default_snooze_delay(),
            max_snoozes: default_max_snoozes(),
            app_name: default_app_name(),
            week_start: WeekStart::default(),
            events_file: None,
        }
    }
}

impl AgendaConfig {
    /// Load the config file, creating a commented default on first run.
    pub fn load() -> AgendaResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> AgendaResult<Self> {
        let config: AgendaConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .build()
            .map_err(|e| AgendaError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AgendaError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> AgendaResult<Self> {
        let config: AgendaConfig = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .map_err(|e| AgendaError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AgendaError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn config_path() -> AgendaResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AgendaError::Config("Could not determine config directory".into()))?
            .join("agenda");

        Ok(config_dir.join("config.toml"))
    }

    fn validate(&self) -> AgendaResult<()> {
        self.snooze_delay().map(|_| ())
    }

    pub fn snooze_delay(&self) -> AgendaResult<TimeDelta> {
        let duration = humantime::parse_duration(&self.snooze_delay).map_err(|e| {
            AgendaError::Config(format!("Invalid snooze_delay '{}': {e}", self.snooze_delay))
        })?;
        TimeDelta::from_std(duration)
            .map_err(|e| AgendaError::Config(format!("snooze_delay out of range: {e}")))
    }

    /// `events_file` with `~` expanded.
    pub fn events_path(&self) -> Option<PathBuf> {
        self.events_file.as_ref().map(|path| {
            PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
        })
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> AgendaResult<()> {
        let contents = format!(
            "\
# agenda configuration

# How long a snoozed reminder waits before showing again:
# snooze_delay = \"{}\"

# How many times one reminder can be snoozed:
# max_snoozes = {}

# Application name shown on desktop notifications:
# app_name = \"{}\"

# First day of the week in week and month views (\"sunday\" or \"monday\"):
# week_start = \"sunday\"

# Event list (JSON) used by `agenda-notify expand` and `agenda-notify due`:
# events_file = \"~/.local/share/agenda/events.json\"
",
            DEFAULT_SNOOZE_DELAY, DEFAULT_MAX_SNOOZES, DEFAULT_APP_NAME
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;

        Ok(())
    }
}
