//! Notification payloads and user actions.

use serde::{Deserialize, Serialize};

use crate::alert::{AlertFireEvent, alert_tag};

/// Snoozes allowed per original alert firing
pub const DEFAULT_MAX_SNOOZES: u32 = 2;

/// What the delivery sink displays. A new notification replaces any shown
/// notification with the same tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub tag: String,
    pub title: String,
    pub body: String,
    pub actions: Vec<NotificationAction>,
    pub data: NotificationData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub event_id: String,
    pub alert_id: String,
    #[serde(default)]
    pub snooze_count: u32,
}

/// Buttons offered on a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAction {
    MarkAsRead,
    Snooze,
}

/// A user interaction with a delivered notification. `action` is `None` when
/// the notification body itself was clicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub action: Option<NotificationAction>,
    pub notification: Notification,
}

impl NotificationAction {
    pub const ALL: [NotificationAction; 2] = [NotificationAction::MarkAsRead, NotificationAction::Snooze];

    pub fn id(self) -> &'static str {
        match self {
            NotificationAction::MarkAsRead => "mark_as_read",
            NotificationAction::Snooze => "snooze",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NotificationAction::MarkAsRead => "Mark as done",
            NotificationAction::Snooze => "Snooze",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.id() == id)
    }
}

impl Notification {
    pub fn from_alert(alert: &AlertFireEvent) -> Self {
        Notification {
            tag: alert.tag.clone(),
            title: alert.title.clone(),
            body: alert.body.clone(),
            actions: NotificationAction::ALL.to_vec(),
            data: NotificationData {
                event_id: alert.event_id.clone(),
                alert_id: alert.alert_id.clone(),
                snooze_count: 0,
            },
        }
    }

    /// The re-delivery for a snooze of this notification, or `None` once
    /// `max_snoozes` is used up. The tag gets the snooze count appended so it
    /// does not replace the original.
    pub fn snoozed(&self, max_snoozes: u32) -> Option<Notification> {
        if self.data.snooze_count >= max_snoozes {
            return None;
        }
        let snooze_count = self.data.snooze_count + 1;
        Some(Notification {
            tag: format!(
                "{}-snooze-{}",
                alert_tag(&self.data.event_id, &self.data.alert_id),
                snooze_count
            ),
            data: NotificationData {
                snooze_count,
                ..self.data.clone()
            },
            ..self.clone()
        })
    }
}
