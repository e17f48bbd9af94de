//! Sync channel protocol.
//!
//! Defines the JSON messages exchanged between the host application and the
//! notification service, one message per line.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::{AgendaError, AgendaResult};
use crate::event::EventDefinition;
use crate::notification::NotificationResponse;

/// Messages sent from the application to the notification service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundMessage {
    /// The full, current event list. Replaces whatever the service holds.
    /// Records that do not deserialize are logged and left out.
    SyncEvents {
        #[serde(deserialize_with = "deserialize_events")]
        events: Vec<EventDefinition>,
    },
    /// Forwarded interaction, for hosts that display notifications themselves.
    NotificationResponse(NotificationResponse),
}

/// Messages sent from the notification service back to the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundMessage {
    /// The user marked an event as done from a notification. The application
    /// persists the flag and sends a fresh `SYNC_EVENTS`.
    MarkEventAsCompleted {
        #[serde(rename = "eventId")]
        event_id: String,
    },
}

fn deserialize_events<'de, D>(deserializer: D) -> Result<Vec<EventDefinition>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;

    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let id = value.get("id").and_then(|id| id.as_str()).map(str::to_string);
            match serde_json::from_value(value) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(index, event_id = ?id, error = %e, "skipping malformed event record");
                    None
                }
            }
        })
        .collect())
}

impl InboundMessage {
    pub fn from_line(line: &str) -> AgendaResult<Self> {
        serde_json::from_str(line).map_err(|e| AgendaError::Serialization(e.to_string()))
    }
}

impl OutboundMessage {
    pub fn to_line(&self) -> AgendaResult<String> {
        serde_json::to_string(self).map_err(|e| AgendaError::Serialization(e.to_string()))
    }
}
