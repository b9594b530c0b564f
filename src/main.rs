//! parkroute - storage path routing service for the photo-park dashboard
//!
//! Serves the admin preview-parse endpoint: parses an ingested photo path
//! and shows which park, camera code and attraction it routes to.
//!
//! Module structure:
//! - `domain/` - Path parser and routing records
//! - `services/` - Resolver and the routing store seam
//! - `io/` - Fixture and REST stores, HTTP endpoint
//! - `infra/` - Config, Metrics

use anyhow::Context;
use clap::Parser;
use parkroute::infra::{Config, Metrics, StoreBackend};
use parkroute::services::PathResolver;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// parkroute - photo path routing preview service
#[derive(Parser, Debug)]
#[command(name = "parkroute", version, about)]
struct Args {
    /// Path to TOML configuration file (falls back to CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging, level via RUST_LOG (default: info)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(git_hash = %env!("GIT_HASH"), "parkroute starting");

    let args = Args::parse();
    let config_path = Config::resolve_config_path(args.config.as_deref());
    let config = Config::load_from_path(&config_path).with_env_overrides();

    let backend = match config.store_backend() {
        StoreBackend::Fixture => "fixture",
        StoreBackend::Rest => "rest",
    };
    info!(
        config_file = %config.config_file(),
        site = %config.site_id(),
        bind_address = %config.bind_address(),
        port = %config.port(),
        store_backend = %backend,
        fixture_file = %config.fixture_file(),
        rest_url = ?config.rest_url(),
        service_key_set = %config.has_service_key(),
        "config_loaded"
    );

    let store = parkroute::io::open_store(&config)?;
    let metrics = Arc::new(Metrics::new());
    let resolver = Arc::new(PathResolver::with_metrics(store, metrics.clone()));

    let addr: SocketAddr = format!("{}:{}", config.bind_address(), config.port())
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind_address(), config.port()))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Periodic metrics summary in the log
    let metrics_interval = config.metrics_interval_secs();
    if metrics_interval > 0 {
        let metrics = metrics.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
            interval.tick().await;
            loop {
                interval.tick().await;
                metrics.report().log();
            }
        });
    }

    // Handle shutdown on Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    parkroute::io::start_http_server(addr, resolver, config.site_id().to_string(), shutdown_rx)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("HTTP server failed")?;

    info!("parkroute shutdown complete");
    Ok(())
}
