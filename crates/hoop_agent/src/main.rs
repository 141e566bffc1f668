mod communication;
mod config;
mod controls;
mod metrics;
mod sensor;

use crate::communication::EventClient;
use crate::config::{Config, SourceKind};
use crate::controls::Control;
use crate::metrics::AgentMetrics;
use crate::sensor::SyntheticDepthSource;
use clap::Parser;
use hoop_core::{
    DepthSource, DetectHitPayload, FrameReport, HitOutcome, NoSensor, Session, TransportEvent,
    TransportOutcome,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Initialization ---
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();
    let config = Config::parse();
    tracing::info!(config = ?config, "Agent starting with configuration");

    let mut session = Session::new(config.session());
    let metrics = Arc::new(AgentMetrics::new(session.id()));

    let mut source: Box<dyn DepthSource> = match config.depth_source {
        SourceKind::Synthetic => Box::new(SyntheticDepthSource::new(
            config.sensor_width,
            config.sensor_height,
            config.sensor_rate_hz,
            rand::random(),
        )),
        SourceKind::Absent => Box::new(NoSensor),
    };
    if !source.is_connected() {
        tracing::warn!("No depth sensor connected; the point cloud will stay empty");
    }

    // --- 2. Start Metrics Server ---
    if let Some(addr) = &config.metrics_listen_addr {
        let metrics_router = metrics.router();
        let metrics_addr: std::net::SocketAddr = addr.parse()?;
        tokio::spawn(async move {
            let listener = match tokio::net::TcpListener::bind(metrics_addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(
                        addr = %metrics_addr,
                        error = %e,
                        "Failed to bind metrics server"
                    );
                    return;
                }
            };
            tracing::info!(addr = %metrics_addr, "Agent metrics server started");
            if let Err(e) = axum::serve(listener, metrics_router.into_make_service()).await {
                tracing::error!(error = %e, "Metrics server exited");
            }
        });
    }

    // --- 3. Spawn Communication Task ---
    let (tx_events, mut rx_events) = mpsc::channel::<TransportEvent>(64);
    let (tx_hits, rx_hits) = mpsc::channel::<DetectHitPayload>(32);
    let client = EventClient::new(config.server_addr.clone(), config.reconnect_delay());
    let comm_handle = tokio::spawn(async move {
        if let Err(e) = client.run(tx_events, rx_hits).await {
            tracing::error!(error = %e, "Communication task exited with an error.");
        } else {
            tracing::info!("Communication task finished gracefully.");
        }
    });

    let (tx_controls, mut rx_controls) = mpsc::channel::<Control>(8);
    tokio::spawn(controls::read_controls(tx_controls));

    // --- 4. Frame Loop ---
    let mut interval = tokio::time::interval(config.frame_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut connections = 0u64;

    tracing::info!(session_id = session.id(), "Starting frame loop...");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received.");
                break;
            },
            Some(event) = rx_events.recv() => {
                if event == TransportEvent::Connected {
                    connections += 1;
                    if connections > 1 {
                        metrics.reconnects_total.inc();
                    }
                }
                record_transport(&metrics, &session.handle_transport(event));
                metrics.set_connection_state(session.connection());
            },
            Some(control) = rx_controls.recv() => match control {
                Control::HoopDepth(depth) => {
                    if let Err(e) = session.set_hoop_depth(depth) {
                        tracing::warn!(error = %e, "Rejected hoop depth");
                    }
                }
                Control::Help => {}
            },
            _ = interval.tick() => {
                let report = session.update(source.as_mut(), Instant::now());
                record_frame(&metrics, &report);
                if let HitOutcome::Emit(hit) = report.hit {
                    if let Err(e) = tx_hits.try_send(hit) {
                        metrics.hits_dropped_total.inc();
                        tracing::warn!(error = %e, "Failed to queue hit; channel may be full.");
                    } else {
                        metrics.hits_emitted_total.inc();
                    }
                }
            }
        }
    }

    drop(tx_hits);
    drop(rx_events);
    if tokio::time::timeout(Duration::from_secs(2), comm_handle).await.is_err() {
        tracing::warn!("Communication task did not stop in time.");
    }
    tracing::info!("Agent shutting down.");
    Ok(())
}

fn record_transport(metrics: &AgentMetrics, outcome: &TransportOutcome) {
    match outcome {
        TransportOutcome::RegionApplied(_) => metrics.region_updates_total.inc(),
        TransportOutcome::RegionRejected(_) => metrics.region_rejections_total.inc(),
        TransportOutcome::Malformed(_) => metrics.malformed_events_total.inc(),
        TransportOutcome::StateChanged(_) | TransportOutcome::Ignored { .. } => {}
    }
}

fn record_frame(metrics: &AgentMetrics, report: &FrameReport) {
    metrics.frames_total.inc();
    if report.scanned {
        metrics.frames_scanned_total.inc();
    }
    metrics.cloud_points.set(report.points as i64);
    metrics.hoop_points.set(report.hit_count as i64);
    if report.hit == HitOutcome::Suppressed {
        metrics.hits_dropped_total.inc();
    }
    tracing::trace!(
        frame = report.frame,
        points = report.points,
        hit_count = report.hit_count,
        hoop = ?report.hoop,
        style = ?report.style,
        "Frame ready for drawing"
    );
}
