//! Notification delivery.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use agenda_core::error::{AgendaError, AgendaResult};
use agenda_core::notification::{Notification, NotificationAction, NotificationResponse};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::scheduler::SchedulerInput;

/// Displays notifications. Delivery is fire-and-forget: the scheduler never
/// waits on the user, and a failed delivery is only logged.
pub trait NotificationSink {
    fn deliver(&mut self, notification: &Notification) -> AgendaResult<()>;
}

/// Tracks the latest delivery of each tag.
///
/// A replaced notification keeps its server id, so every listener that was
/// started for that id sees the same action. Only the listener of the latest
/// delivery may forward it.
#[derive(Clone, Default)]
pub struct DeliveryTracker {
    latest: Arc<Mutex<HashMap<String, u64>>>,
}

impl DeliveryTracker {
    /// Record a new delivery of `tag` and return its serial.
    pub fn begin(&self, tag: &str) -> u64 {
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        let serial = latest.get(tag).map_or(0, |serial| serial + 1);
        latest.insert(tag.to_string(), serial);
        serial
    }

    /// Whether `serial` is still the latest delivery of `tag`.
    pub fn is_current(&self, tag: &str, serial: u64) -> bool {
        let latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        latest.get(tag) == Some(&serial)
    }
}

/// Desktop notifications through the platform notification server.
///
/// On freedesktop platforms a notification with an already shown tag reuses
/// that notification's id so the server replaces it, and the chosen action
/// is sent back to the scheduler.
pub struct DesktopSink {
    app_name: String,
    shown: HashMap<String, u32>,
    deliveries: DeliveryTracker,
    responses: mpsc::Sender<SchedulerInput>,
}

impl DesktopSink {
    pub fn new(app_name: &str, responses: mpsc::Sender<SchedulerInput>) -> Self {
        DesktopSink {
            app_name: app_name.to_string(),
            shown: HashMap::new(),
            deliveries: DeliveryTracker::default(),
            responses,
        }
    }

    fn build(&self, notification: &Notification) -> notify_rust::Notification {
        let mut desktop = notify_rust::Notification::new();
        desktop
            .appname(&self.app_name)
            .summary(&notification.title)
            .body(&notification.body);
        for action in &notification.actions {
            desktop.action(action.id(), action.label());
        }
        desktop
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
impl NotificationSink for DesktopSink {
    fn deliver(&mut self, notification: &Notification) -> AgendaResult<()> {
        let mut desktop = self.build(notification);
        if let Some(id) = self.shown.get(&notification.tag) {
            desktop.id(*id);
        }

        let handle = desktop
            .show()
            .map_err(|e| AgendaError::Delivery(e.to_string()))?;
        self.shown.insert(notification.tag.clone(), handle.id());

        let serial = self.deliveries.begin(&notification.tag);
        let deliveries = self.deliveries.clone();
        let responses = self.responses.clone();
        let notification = notification.clone();
        // wait_for_action blocks on D-Bus until the notification is closed
        std::thread::spawn(move || {
            handle.wait_for_action(|action_id| {
                if action_id == "__closed" {
                    return;
                }
                if !deliveries.is_current(&notification.tag, serial) {
                    debug!(tag = %notification.tag, "action already handled by a newer delivery");
                    return;
                }
                let response = NotificationResponse {
                    action: NotificationAction::from_id(action_id),
                    notification,
                };
                if responses
                    .blocking_send(SchedulerInput::Response(response))
                    .is_err()
                {
                    debug!("scheduler gone, dropping notification action");
                }
            });
        });

        Ok(())
    }
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
impl NotificationSink for DesktopSink {
    fn deliver(&mut self, notification: &Notification) -> AgendaResult<()> {
        // No replace-by-id or action callbacks on this platform
        let _ = (&self.shown, &self.deliveries, &self.responses);
        self.build(notification)
            .show()
            .map(|_| ())
            .map_err(|e| AgendaError::Delivery(e.to_string()))
    }
}

/// Logs notifications instead of displaying them.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&mut self, notification: &Notification) -> AgendaResult<()> {
        info!(
            tag = %notification.tag,
            title = %notification.title,
            body = %notification.body,
            "notification"
        );
        Ok(())
    }
}
