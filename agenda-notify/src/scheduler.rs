//! Reminder scheduling state machine.
//!
//! The scheduler owns the latest synchronized event list, runs an evaluation
//! pass on every tick and keeps pending snoozes. It never sleeps itself: the
//! async driver in `service` decides when to call `tick` and hands back the
//! ticket it was given. Each new event list bumps the generation, which turns
//! every older ticket stale so a tick armed for a previous list can never run.

use agenda_core::alert::scan_event;
use agenda_core::event::EventDefinition;
use agenda_core::notification::{
    DEFAULT_MAX_SNOOZES, Notification, NotificationAction, NotificationResponse,
};
use agenda_core::protocol::OutboundMessage;
use chrono::{NaiveDateTime, TimeDelta};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::sink::NotificationSink;

/// Everything the scheduler task consumes, funneled through one channel.
#[derive(Debug)]
pub enum SchedulerInput {
    Sync(Vec<EventDefinition>),
    Response(NotificationResponse),
}

/// Permission to run one tick for a given event list generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTicket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No event list received yet
    Idle,
    /// A tick is pending for the current generation
    Armed,
}

#[derive(Debug, Clone)]
pub struct SnoozePolicy {
    pub delay: TimeDelta,
    pub max_snoozes: u32,
}

impl Default for SnoozePolicy {
    fn default() -> Self {
        SnoozePolicy {
            delay: TimeDelta::minutes(5),
            max_snoozes: DEFAULT_MAX_SNOOZES,
        }
    }
}

#[derive(Debug)]
struct PendingSnooze {
    due: NaiveDateTime,
    notification: Notification,
}

pub struct NotificationScheduler<C, S> {
    clock: C,
    sink: S,
    snooze_policy: SnoozePolicy,
    events: Vec<EventDefinition>,
    generation: u64,
    state: SchedulerState,
    snoozes: Vec<PendingSnooze>,
}

impl<C: Clock, S: NotificationSink> NotificationScheduler<C, S> {
    pub fn new(clock: C, sink: S, snooze_policy: SnoozePolicy) -> Self {
        NotificationScheduler {
            clock,
            sink,
            snooze_policy,
            events: Vec::new(),
            generation: 0,
            state: SchedulerState::Idle,
            snoozes: Vec::new(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn events(&self) -> &[EventDefinition] {
        &self.events
    }

    /// Replace the stored list, invalidate any pending tick and evaluate
    /// immediately. The returned ticket arms the next tick.
    pub fn receive_event_list(&mut self, events: Vec<EventDefinition>) -> TickTicket {
        self.events = events;
        self.generation += 1;
        debug!(
            generation = self.generation,
            events = self.events.len(),
            "received event list"
        );

        self.evaluate();
        self.state = SchedulerState::Armed;

        TickTicket {
            generation: self.generation,
        }
    }

    /// Run one evaluation pass if `ticket` belongs to the current list.
    /// Returns the ticket to re-arm with, or `None` when it was stale.
    pub fn tick(&mut self, ticket: TickTicket) -> Option<TickTicket> {
        if ticket.generation != self.generation {
            debug!(
                stale = ticket.generation,
                current = self.generation,
                "ignoring tick for a replaced event list"
            );
            return None;
        }

        self.evaluate();
        Some(ticket)
    }

    /// Check every stored event and deliver the alerts due now.
    fn evaluate(&mut self) {
        let now = self.clock.now();

        for event in &self.events {
            let alerts = match scan_event(event, now) {
                Ok(alerts) => alerts,
                Err(e) => {
                    warn!(event_id = %event.id, error = %e, "skipping event in alert scan");
                    continue;
                }
            };

            for alert in &alerts {
                deliver(&mut self.sink, &Notification::from_alert(alert));
            }
        }
    }

    /// React to a user interaction with a delivered notification.
    pub fn handle_response(&mut self, response: NotificationResponse) -> Option<OutboundMessage> {
        match response.action {
            Some(NotificationAction::MarkAsRead) => Some(OutboundMessage::MarkEventAsCompleted {
                event_id: response.notification.data.event_id,
            }),
            Some(NotificationAction::Snooze) => {
                self.snooze(&response.notification);
                None
            }
            None => None,
        }
    }

    fn snooze(&mut self, notification: &Notification) {
        let Some(snoozed) = notification.snoozed(self.snooze_policy.max_snoozes) else {
            debug!(tag = %notification.tag, "snooze limit reached, dropping request");
            return;
        };

        let due = self.clock.now() + self.snooze_policy.delay;
        debug!(tag = %snoozed.tag, %due, "snoozed notification");
        self.snoozes.push(PendingSnooze {
            due,
            notification: snoozed,
        });
    }

    /// Deliver every snoozed notification whose time has come.
    pub fn deliver_due_snoozes(&mut self) {
        let now = self.clock.now();
        let (due, pending): (Vec<_>, Vec<_>) =
            self.snoozes.drain(..).partition(|snooze| snooze.due <= now);
        self.snoozes = pending;

        for snooze in due {
            deliver(&mut self.sink, &snooze.notification);
        }
    }

    /// Time left until the earliest pending snooze, zero if already due.
    pub fn next_snooze_in(&self) -> Option<std::time::Duration> {
        let now = self.clock.now();
        self.snoozes
            .iter()
            .map(|snooze| snooze.due)
            .min()
            .map(|due| (due - now).to_std().unwrap_or_default())
    }
}

fn deliver<S: NotificationSink>(sink: &mut S, notification: &Notification) {
    if let Err(e) = sink.deliver(notification) {
        warn!(tag = %notification.tag, error = %e, "notification delivery failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::ManualClock;
    use crate::sink::testing::RecordingSink;
    use agenda_core::event::{AlertRule, AlertUnit, Frequency, RepeatRule};
    use chrono::NaiveDate;

    fn at(h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn event(id: &str, time: &str, lead_minutes: u32) -> EventDefinition {
        EventDefinition {
            id: id.to_string(),
            calendar_id: "personal".to_string(),
            title: format!("Event {id}"),
            description: None,
            category: None,
            date: "2024-06-01".to_string(),
            start_time: Some(time.to_string()),
            is_all_day: false,
            repeat: None,
            alerts: vec![AlertRule {
                id: "a".to_string(),
                value: lead_minutes,
                unit: AlertUnit::Minutes,
            }],
            is_completed: false,
        }
    }

    fn scheduler(
        now: NaiveDateTime,
    ) -> (
        NotificationScheduler<ManualClock, RecordingSink>,
        ManualClock,
        RecordingSink,
    ) {
        let clock = ManualClock::at(now);
        let sink = RecordingSink::default();
        let scheduler = NotificationScheduler::new(clock.clone(), sink.clone(), SnoozePolicy::default());
        (scheduler, clock, sink)
    }

    fn snooze(notification: &Notification) -> NotificationResponse {
        NotificationResponse {
            action: Some(NotificationAction::Snooze),
            notification: notification.clone(),
        }
    }

    #[test]
    fn test_receive_evaluates_immediately_and_arms() {
        let (mut scheduler, _, sink) = scheduler(at(9, 45));
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        scheduler.receive_event_list(vec![event("e1", "10:00", 15)]);

        assert_eq!(sink.tags(), vec!["e1-a"]);
        assert_eq!(scheduler.state(), SchedulerState::Armed);
    }

    #[test]
    fn test_tick_uses_time_at_tick() {
        let (mut scheduler, clock, sink) = scheduler(at(9, 44));
        let ticket = scheduler.receive_event_list(vec![event("e1", "10:00", 15)]);
        assert!(sink.tags().is_empty());

        clock.advance(TimeDelta::seconds(60));
        let ticket = scheduler.tick(ticket).expect("current ticket");
        assert_eq!(sink.tags(), vec!["e1-a"]);

        // The next minute is outside the due window, nothing fires twice
        clock.advance(TimeDelta::seconds(60));
        scheduler.tick(ticket);
        assert_eq!(sink.tags(), vec!["e1-a"]);
    }

    #[test]
    fn test_replacing_list_makes_pending_tick_stale() {
        let (mut scheduler, clock, sink) = scheduler(at(9, 0));
        let stale = scheduler.receive_event_list(vec![event("a", "10:00", 59)]);
        let current = scheduler.receive_event_list(vec![event("b", "10:00", 59)]);

        clock.advance(TimeDelta::seconds(60));

        assert_eq!(scheduler.tick(stale), None);
        assert!(sink.tags().is_empty());

        assert_eq!(scheduler.tick(current), Some(current));
        assert_eq!(sink.tags(), vec!["b-a"]);
    }

    #[test]
    fn test_completed_event_is_not_notified() {
        let (mut scheduler, _, sink) = scheduler(at(9, 45));
        let mut done = event("e1", "10:00", 15);
        done.is_completed = true;

        scheduler.receive_event_list(vec![done]);

        assert!(sink.tags().is_empty());
    }

    #[test]
    fn test_bad_record_does_not_block_others() {
        let (mut scheduler, _, sink) = scheduler(at(9, 45));
        let mut broken = event("broken", "10:00", 15);
        broken.date = "2024-06-31".to_string();
        let mut untimed = event("untimed", "", 15);
        untimed.start_time = None;

        scheduler.receive_event_list(vec![broken, untimed, event("ok", "10:00", 15)]);

        assert_eq!(sink.tags(), vec!["ok-a"]);
    }

    #[test]
    fn test_delivery_failures_are_not_fatal() {
        let clock = ManualClock::at(at(9, 45));
        let sink = RecordingSink::failing();
        let mut scheduler = NotificationScheduler::new(clock, sink.clone(), SnoozePolicy::default());

        let ticket = scheduler.receive_event_list(vec![event("e1", "10:00", 15), event("e2", "10:00", 15)]);

        assert_eq!(sink.tags(), vec!["e1-a", "e2-a"]);
        assert!(scheduler.tick(ticket).is_some());
    }

    #[test]
    fn test_recurring_event_reuses_tag_across_days() {
        let (mut scheduler, clock, sink) = scheduler(at(8, 50));
        let mut daily = event("daily", "09:00", 10);
        daily.date = "2024-05-01".to_string();
        daily.repeat = Some(RepeatRule::new(Frequency::Daily, 1));

        let ticket = scheduler.receive_event_list(vec![daily]);
        clock.advance(TimeDelta::days(1));
        scheduler.tick(ticket);

        assert_eq!(sink.tags(), vec!["daily-a", "daily-a"]);
    }

    #[test]
    fn test_mark_as_read_goes_to_the_application() {
        let (mut scheduler, _, sink) = scheduler(at(9, 45));
        scheduler.receive_event_list(vec![event("e1", "10:00", 15)]);
        let delivered = sink.delivered().remove(0);

        let outbound = scheduler.handle_response(NotificationResponse {
            action: Some(NotificationAction::MarkAsRead),
            notification: delivered,
        });

        assert_eq!(
            outbound,
            Some(OutboundMessage::MarkEventAsCompleted {
                event_id: "e1".to_string()
            })
        );
        assert_eq!(sink.tags(), vec!["e1-a"]);
    }

    #[test]
    fn test_body_click_does_nothing() {
        let (mut scheduler, _, sink) = scheduler(at(9, 45));
        scheduler.receive_event_list(vec![event("e1", "10:00", 15)]);
        let delivered = sink.delivered().remove(0);

        let outbound = scheduler.handle_response(NotificationResponse {
            action: None,
            notification: delivered,
        });

        assert_eq!(outbound, None);
        assert_eq!(scheduler.next_snooze_in(), None);
    }

    #[test]
    fn test_snooze_redelivers_after_delay_with_suffixed_tag() {
        let (mut scheduler, clock, sink) = scheduler(at(9, 45));
        scheduler.receive_event_list(vec![event("e1", "10:00", 15)]);
        let original = sink.delivered().remove(0);
        sink.clear();

        scheduler.handle_response(snooze(&original));
        assert_eq!(scheduler.next_snooze_in(), Some(std::time::Duration::from_secs(300)));

        clock.advance(TimeDelta::minutes(4));
        scheduler.deliver_due_snoozes();
        assert!(sink.tags().is_empty());

        clock.advance(TimeDelta::minutes(1));
        scheduler.deliver_due_snoozes();
        assert_eq!(sink.tags(), vec!["e1-a-snooze-1"]);
        assert_eq!(scheduler.next_snooze_in(), None);
    }

    #[test]
    fn test_third_snooze_is_dropped() {
        let (mut scheduler, clock, sink) = scheduler(at(9, 45));
        scheduler.receive_event_list(vec![event("e1", "10:00", 15)]);
        let mut latest = sink.delivered().remove(0);

        for expected in ["e1-a-snooze-1", "e1-a-snooze-2"] {
            scheduler.handle_response(snooze(&latest));
            clock.advance(TimeDelta::minutes(5));
            scheduler.deliver_due_snoozes();
            latest = sink.delivered().pop().unwrap();
            assert_eq!(latest.tag, expected);
        }

        scheduler.handle_response(snooze(&latest));

        assert_eq!(scheduler.next_snooze_in(), None);
    }

    #[test]
    fn test_snoozes_survive_list_replacement() {
        let (mut scheduler, clock, sink) = scheduler(at(9, 45));
        scheduler.receive_event_list(vec![event("e1", "10:00", 15)]);
        let original = sink.delivered().remove(0);
        scheduler.handle_response(snooze(&original));

        scheduler.receive_event_list(Vec::new());
        clock.advance(TimeDelta::minutes(5));
        scheduler.deliver_due_snoozes();

        assert_eq!(sink.tags(), vec!["e1-a", "e1-a-snooze-1"]);
    }
}
