//! Async driver for the scheduler.
//!
//! A single task owns the scheduler and multiplexes three things: inbound
//! messages, the one pending tick and the earliest snooze. Nothing else
//! touches the scheduler, so no locking is involved.

use agenda_core::alert::TICK_PERIOD;
use agenda_core::protocol::OutboundMessage;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::scheduler::{NotificationScheduler, SchedulerInput, TickTicket};
use crate::sink::NotificationSink;

/// Run until the inbound channel closes.
///
/// Resolving or dropping `shutdown` closes the inbound channel: whatever is
/// already queued is still handled, then the loop ends even if senders remain.
pub async fn run<C: Clock, S: NotificationSink>(
    mut scheduler: NotificationScheduler<C, S>,
    mut inbound: mpsc::Receiver<SchedulerInput>,
    outbound: mpsc::Sender<OutboundMessage>,
    mut shutdown: oneshot::Receiver<()>,
) {
    // At most one tick is ever pending
    let mut pending_tick: Option<(TickTicket, Instant)> = None;
    let mut closing = false;

    loop {
        let snooze_at = scheduler.next_snooze_in().map(|delay| Instant::now() + delay);
        let wake_at = earliest(pending_tick.map(|(_, at)| at), snooze_at);

        tokio::select! {
            _ = &mut shutdown, if !closing => {
                debug!("shutdown requested, draining sync channel");
                inbound.close();
                closing = true;
            }
            input = inbound.recv() => {
                let Some(input) = input else {
                    info!("sync channel closed, stopping scheduler");
                    break;
                };
                match input {
                    SchedulerInput::Sync(events) => {
                        let ticket = scheduler.receive_event_list(events);
                        pending_tick = Some((ticket, Instant::now() + TICK_PERIOD));
                        debug!(
                            events = scheduler.events().len(),
                            state = ?scheduler.state(),
                            "event list synced"
                        );
                    }
                    SchedulerInput::Response(response) => {
                        if let Some(message) = scheduler.handle_response(response) {
                            if outbound.send(message).await.is_err() {
                                debug!("outbound channel closed, dropping message");
                            }
                        }
                    }
                }
            }
            _ = sleep_until_opt(wake_at) => {
                if let Some((ticket, at)) = pending_tick {
                    if at <= Instant::now() {
                        // Re-armed after the pass, so a slow pass delays the next tick
                        pending_tick = scheduler
                            .tick(ticket)
                            .map(|ticket| (ticket, Instant::now() + TICK_PERIOD));
                    }
                }
                scheduler.deliver_due_snoozes();
            }
        }
    }
}

fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

async fn sleep_until_opt(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
