mod command;
mod metrics;
mod server;

use crate::command::{Command, HELP};
use crate::metrics::ControllerMetrics;
use clap::Parser;
use hoop_core::Placement;
use std::{net::SocketAddr, sync::Arc};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::TcpListener,
    sync::watch,
};
use tracing_subscriber::{fmt, EnvFilter};

/// `hoop_controller` - Places the hoop for connected agents and logs their hits.
///
/// Reads placement commands from stdin and pushes each one to every connected
/// `hoop_agent` as a `drawHoop` event.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
struct Config {
    /// Address agents connect to.
    #[arg(long, env = "CONTROLLER_LISTEN_ADDR", default_value = "0.0.0.0:3000")]
    listen_addr: SocketAddr,

    /// Listen address for the Prometheus metrics server. Disabled when unset.
    #[arg(long, env = "CONTROLLER_METRICS_LISTEN_ADDR")]
    metrics_listen_addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cfg = Config::parse();
    tracing::info!(config = ?cfg, "Starting hoop controller");

    let metrics = Arc::new(ControllerMetrics::new());

    // Start metrics server
    if let Some(metrics_addr) = cfg.metrics_listen_addr {
        let router = metrics.router();
        tokio::spawn(async move {
            let listener = TcpListener::bind(metrics_addr).await?;
            tracing::info!(addr = %metrics_addr, "Metrics server started");
            axum::serve(listener, router.into_make_service()).await?;
            Ok::<(), anyhow::Error>(())
        });
    }

    let (tx_placements, rx_placements) = watch::channel::<Option<Placement>>(None);
    let (quit_tx, mut quit_rx) = watch::channel(false);
    tokio::spawn(read_commands(tx_placements, quit_tx, metrics.clone()));

    let listener = TcpListener::bind(cfg.listen_addr).await?;
    tracing::info!(addr = %cfg.listen_addr, "Hoop controller listening");
    eprintln!("{HELP}");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received.");
                break;
            }
            Ok(()) = quit_rx.changed() => break,
            accepted = listener.accept() => {
                let (stream, agent) = accepted?;
                let placements = rx_placements.clone();
                let metrics_clone = metrics.clone();

                tokio::spawn(async move {
                    metrics_clone.agents_connected_total.inc();
                    metrics_clone.active_agents.inc();
                    tracing::info!(agent = %agent, "Agent connected");

                    if let Err(e) =
                        server::handle_agent(stream, agent, placements, metrics_clone.clone()).await
                    {
                        tracing::warn!(error = %e, agent = %agent, "Connection ended with error");
                    } else {
                        tracing::info!(agent = %agent, "Agent disconnected");
                    }

                    metrics_clone.active_agents.dec();
                });
            }
        }
    }

    Ok(())
}

async fn read_commands(
    tx: watch::Sender<Option<Placement>>,
    quit: watch::Sender<bool>,
    metrics: Arc<ControllerMetrics>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::info!("stdin closed; placements are fixed from now on");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read stdin");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match Command::parse(&line) {
            Ok(Command::Place(placement)) => {
                tracing::info!(
                    placement = ?placement,
                    agents = tx.receiver_count().saturating_sub(1),
                    "Publishing hoop placement"
                );
                tx.send_replace(Some(placement));
                metrics.placements_total.inc();
            }
            Ok(Command::Help) => eprintln!("{HELP}"),
            Ok(Command::Quit) => {
                let _ = quit.send(true);
                return;
            }
            Err(e) => eprintln!("error: {e:#}\n{HELP}"),
        }
    }
}
