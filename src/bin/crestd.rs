//! crestd, the Crest daemon.
//!
//! Serves loud-event decisions over HTTP to the browser extension.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

use crest::CrestError;
use crest::server::config::{Config, Secrets};
use crest::server::{AppState, ServiceInfo, router};

/// Histogram buckets are folded on this interval.
const METRICS_UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

/// Crest daemon: loud-event decision service.
#[derive(Parser)]
#[command(name = "crestd")]
#[command(version = crest::PKG_VERSION)]
#[command(about = "Crest loud-event decision daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to secrets file.
    #[arg(long)]
    secrets: Option<PathBuf>,

    /// Override the bind address from the config file.
    #[arg(short, long, env = "CREST_ADDRESS")]
    address: Option<String>,

    /// Log output format.
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load(args.secrets.as_deref())?;

    let engine = config.engine_builder(&secrets).build()?;
    let mode = engine.mode();

    let metrics = install_metrics()?;

    let address = args.address.unwrap_or_else(|| config.server.address.clone());
    let addr: SocketAddr = address
        .parse()
        .map_err(|e| CrestError::Configuration(format!("Invalid address: {e}")))?;

    let state = AppState::new(
        Arc::new(engine),
        ServiceInfo {
            service: config.server.service.clone(),
            version: crest::PKG_VERSION.to_string(),
            environment: config.server.environment.clone(),
        },
    )
    .with_metrics(metrics);

    info!(
        version = crest::PKG_VERSION,
        %addr,
        mode = mode.as_str(),
        service = %config.server.service,
        environment = %config.server.environment,
        "crestd starting"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("crestd stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Install the prometheus recorder and keep its histograms compacted.
fn install_metrics() -> Result<PrometheusHandle, CrestError> {
    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        CrestError::Configuration(format!("failed to install metrics recorder: {e}"))
    })?;

    let upkeep = handle.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(METRICS_UPKEEP_INTERVAL);
        loop {
            interval.tick().await;
            upkeep.run_upkeep();
        }
    });

    Ok(handle)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until killed.
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
