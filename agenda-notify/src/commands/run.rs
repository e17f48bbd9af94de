use agenda_core::config::AgendaConfig;
use anyhow::Result;
use tokio::io::BufReader;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::channel;
use crate::clock::SystemClock;
use crate::scheduler::{NotificationScheduler, SnoozePolicy};
use crate::service;
use crate::sink::{DesktopSink, LogSink};

const CHANNEL_CAPACITY: usize = 64;

pub async fn run(config: AgendaConfig, no_desktop: bool) -> Result<()> {
    let policy = SnoozePolicy {
        delay: config.snooze_delay()?,
        max_snoozes: config.max_snoozes,
    };

    let (inbound_tx, inbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);

    // The reader owns the shutdown sender, so stdin EOF drains and stops the
    // service even while the desktop sink still holds an inbound sender
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let stdin_tx = inbound_tx.clone();
    let reader = tokio::spawn(async move {
        let result = channel::read_inbound(BufReader::new(tokio::io::stdin()), stdin_tx).await;
        drop(shutdown_tx);
        result
    });
    let writer = tokio::spawn(channel::write_outbound(tokio::io::stdout(), outbound_rx));

    info!(
        snooze_delay = %config.snooze_delay,
        max_snoozes = config.max_snoozes,
        desktop = !no_desktop,
        "notification scheduler started"
    );

    if no_desktop {
        drop(inbound_tx);
        let scheduler = NotificationScheduler::new(SystemClock, LogSink, policy);
        service::run(scheduler, inbound_rx, outbound_tx, shutdown_rx).await;
    } else {
        // Desktop actions come back through the host's channel
        let sink = DesktopSink::new(&config.app_name, inbound_tx);
        let scheduler = NotificationScheduler::new(SystemClock, sink, policy);
        service::run(scheduler, inbound_rx, outbound_tx, shutdown_rx).await;
    }

    if let Err(e) = reader.await? {
        warn!(error = %e, "sync channel read failed");
    }
    writer.await??;

    Ok(())
}
