//! Sync channel over stdin/stdout.
//!
//! The host application writes one JSON message per line to stdin and reads
//! the service's replies, one per line, from stdout. Logs go to stderr so
//! they never mix with the protocol.

use agenda_core::protocol::{InboundMessage, OutboundMessage};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::scheduler::SchedulerInput;

/// Forward every well-formed inbound line to the scheduler until the reader
/// hits EOF or the scheduler goes away. Malformed lines are logged and
/// skipped.
pub async fn read_inbound<R: AsyncBufRead + Unpin>(
    reader: R,
    scheduler: mpsc::Sender<SchedulerInput>,
) -> std::io::Result<()> {
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let input = match InboundMessage::from_line(&line) {
            Ok(InboundMessage::SyncEvents { events }) => SchedulerInput::Sync(events),
            Ok(InboundMessage::NotificationResponse(response)) => {
                SchedulerInput::Response(response)
            }
            Err(e) => {
                warn!(error = %e, "ignoring malformed sync message");
                continue;
            }
        };

        if scheduler.send(input).await.is_err() {
            debug!("scheduler stopped, no longer reading sync channel");
            break;
        }
    }

    Ok(())
}

/// Write outbound messages as JSON lines until every sender is dropped.
pub async fn write_outbound<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut outbound: mpsc::Receiver<OutboundMessage>,
) -> std::io::Result<()> {
    while let Some(message) = outbound.recv().await {
        let line = match message.to_line() {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "could not encode outbound message");
                continue;
            }
        };
        writer.write_all(format!("{line}\n").as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}
