use hoop_core::{DetectHitPayload, Envelope, TransportEvent, DETECT_HIT};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Keeps a line-delimited JSON event socket to the controller open.
///
/// Lifecycle and inbound lines go to `tx_events`; hits from `rx_hits` are written
/// out while connected and dropped otherwise. Reconnects after `reconnect_delay`
/// until the frame loop drops its end of either channel.
pub struct EventClient {
    addr: String,
    reconnect_delay: Duration,
}

impl EventClient {
    pub fn new(addr: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self {
            addr: addr.into(),
            reconnect_delay,
        }
    }

    pub async fn run(
        self,
        tx_events: mpsc::Sender<TransportEvent>,
        mut rx_hits: mpsc::Receiver<DetectHitPayload>,
    ) -> anyhow::Result<()> {
        loop {
            match TcpStream::connect(&self.addr).await {
                Ok(stream) => {
                    tracing::info!(addr = %self.addr, "Connected to hoop controller");
                    if tx_events.send(TransportEvent::Connected).await.is_err() {
                        return Ok(());
                    }
                    let res = pump(stream, &tx_events, &mut rx_hits).await;
                    if tx_events.send(TransportEvent::Disconnected).await.is_err() {
                        return Ok(());
                    }
                    match res {
                        Ok(Pump::PeerClosed) => {
                            tracing::warn!(addr = %self.addr, "Controller closed the socket")
                        }
                        Ok(Pump::LocalClosed) => return Ok(()),
                        Err(e) => {
                            tracing::warn!(addr = %self.addr, error = %e, "Socket error")
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!(addr = %self.addr, error = %e, "Connect failed");
                }
            }

            // Hits raised while offline are stale by the time we reconnect.
            tokio::select! {
                _ = sleep(self.reconnect_delay) => {}
                _ = drain(&mut rx_hits) => return Ok(()),
            }
        }
    }
}

enum Pump {
    PeerClosed,
    LocalClosed,
}

async fn pump(
    stream: TcpStream,
    tx_events: &mpsc::Sender<TransportEvent>,
    rx_hits: &mut mpsc::Receiver<DetectHitPayload>,
) -> anyhow::Result<Pump> {
    let (r, mut w) = stream.into_split();
    let mut lines = BufReader::new(r).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(Pump::PeerClosed);
                };
                if line.trim().is_empty() {
                    continue;
                }
                if tx_events.send(TransportEvent::Message(line)).await.is_err() {
                    return Ok(Pump::LocalClosed);
                }
            }
            hit = rx_hits.recv() => {
                let Some(hit) = hit else {
                    let _ = w.shutdown().await;
                    return Ok(Pump::LocalClosed);
                };
                let line = Envelope::new(DETECT_HIT, &hit)?.to_line()?;
                w.write_all(line.as_bytes()).await?;
            }
        }
    }
}

/// Discards queued hits; resolves once the sender side is gone.
async fn drain(rx_hits: &mut mpsc::Receiver<DetectHitPayload>) {
    while let Some(hit) = rx_hits.recv().await {
        tracing::debug!(frame = hit.frame, "Dropping hit while disconnected");
    }
}
