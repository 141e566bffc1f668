use crate::metrics::ControllerMetrics;
use hoop_core::{DetectHitPayload, Envelope, Placement, DETECT_HIT, DRAW_HOOP};
use std::{net::SocketAddr, sync::Arc};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
    sync::watch,
};

/// Serves one agent: sends the current hoop (if any) on connect and every later
/// placement, and logs the hits it reports.
pub async fn handle_agent(
    stream: TcpStream,
    agent: SocketAddr,
    mut placements: watch::Receiver<Option<Placement>>,
    metrics: Arc<ControllerMetrics>,
) -> anyhow::Result<()> {
    let (r, mut w) = stream.into_split();
    let mut lines = BufReader::new(r).lines();

    let current = *placements.borrow_and_update();
    if let Some(placement) = current {
        send_placement(&mut w, &placement).await?;
    }

    // Once the command reader is gone the last placement stays in force; the
    // agent keeps being served until it hangs up or the process exits.
    let mut placements_open = true;
    loop {
        tokio::select! {
            changed = placements.changed(), if placements_open => {
                if changed.is_err() {
                    tracing::debug!(agent = %agent, "Placement feed closed");
                    placements_open = false;
                    continue;
                }
                let current = *placements.borrow_and_update();
                if let Some(placement) = current {
                    send_placement(&mut w, &placement).await?;
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => handle_line(&line, agent, &metrics),
                    None => return Ok(()),
                }
            }
        }
    }
}

async fn send_placement<W: AsyncWriteExt + Unpin>(
    w: &mut W,
    placement: &Placement,
) -> anyhow::Result<()> {
    let line = Envelope::new(DRAW_HOOP, placement)?.to_line()?;
    w.write_all(line.as_bytes()).await?;
    Ok(())
}

fn handle_line(line: &str, agent: SocketAddr, metrics: &ControllerMetrics) {
    if line.trim().is_empty() {
        return;
    }
    let envelope = match Envelope::from_line(line) {
        Ok(e) => e,
        Err(e) => {
            metrics.malformed_events_total.inc();
            tracing::warn!(agent = %agent, error = %e, "Dropping malformed event");
            return;
        }
    };

    if envelope.event != DETECT_HIT {
        tracing::debug!(agent = %agent, event = %envelope.event, "Ignoring event");
        return;
    }
    metrics.hits_received_total.inc();
    match envelope.payload::<DetectHitPayload>() {
        Ok(hit) => tracing::info!(
            agent = %agent,
            session_id = %hit.session_id,
            frame = hit.frame,
            points = hit.points,
            "Hit detected"
        ),
        // The payload is informational; the event alone counts as a hit.
        Err(e) => tracing::info!(agent = %agent, error = %e, "Hit detected"),
    }
}
