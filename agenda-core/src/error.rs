//! Error types for agenda.

use thiserror::Error;

/// Errors that can occur in agenda operations.
#[derive(Error, Debug)]
pub enum AgendaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date '{value}' on event '{event_id}'")]
    InvalidDate { event_id: String, value: String },

    #[error("Invalid start time '{value}' on event '{event_id}'")]
    InvalidTime { event_id: String, value: String },

    #[error("Date arithmetic out of range for event '{0}'")]
    DateOutOfRange(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for agenda operations.
pub type AgendaResult<T> = Result<T, AgendaError>;
