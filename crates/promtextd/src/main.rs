//! promtextd — the promtext exporter daemon.
//!
//! # Usage
//!
//! ```text
//! promtextd serve --config /etc/promtextd.toml --port 9464
//! promtextd init > promtextd.toml
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use promtextd::{AppState, ExporterConfig, ExporterMetrics, build_router, updater};

#[derive(Parser)]
#[command(name = "promtextd", about = "promtext metrics exporter")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve /metrics over HTTP.
    Serve {
        /// Path to promtextd.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides the config file).
        #[arg(long)]
        port: Option<u16>,

        /// Background update interval in seconds (overrides the config file).
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        update_interval: Option<u64>,
    },
    /// Print a starter config to stdout.
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,promtextd=debug,promtext=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            port,
            update_interval,
        } => {
            let mut config = match config {
                Some(path) => ExporterConfig::from_file(&path)?,
                None => ExporterConfig::default(),
            };
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(secs) = update_interval {
                config.server.update_interval_secs = secs;
            }
            config.validate()?;
            serve(config).await
        }
        Command::Init => {
            print!("{}", ExporterConfig::scaffold().to_toml_string()?);
            Ok(())
        }
    }
}

async fn serve(config: ExporterConfig) -> anyhow::Result<()> {
    let metrics = ExporterMetrics::new(&config)?;
    info!(statics = config.metrics.len(), "metrics initialized");

    let state = AppState::new(metrics);

    // ── Background updates ─────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let interval = Duration::from_secs(config.server.update_interval_secs);
    let updater_handle = tokio::spawn(updater::run(state.clone(), interval, shutdown_rx));

    // ── HTTP server ────────────────────────────────────────────

    let router = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!(%addr, "exporter listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    let _ = updater_handle.await;

    info!("promtextd stopped");
    Ok(())
}
