// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Rolebook — bookshelf & role-card backend
//
//  HTTP surface:  axum on tokio
//  Storage:       PostgreSQL (primary) + PostgreSQL (request logs)
//  Request logs:  async capture → bounded queue → batch writer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use anyhow::Context;
use axum::middleware;
use clap::Parser;
use rolebook_api::server::{AppState, build_router};
use rolebook_core::config::AppConfig;
use rolebook_observability::{PgLogSink, PipelineMetrics, capture_request, spawn_pipeline};
use rolebook_store::{PgStore, PgStoreConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "rolebook", version, about = "Rolebook backend service")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/rolebook/rolebook.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Rolebook starting");

    // ── Config ──
    let config = if cli.config.exists() {
        info!(path = %cli.config.display(), "Loading config file");
        AppConfig::load(&cli.config)?
    } else {
        info!("No config file found, using defaults");
        AppConfig::default()
    };

    // ── Primary database ──
    let store = PgStore::connect(&PgStoreConfig {
        database_url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        connect_timeout_secs: config.database.connect_timeout_secs,
    })
    .await
    .context("primary database init failed")?;
    let store = Arc::new(store);
    info!("Primary database connected");

    // ── Metrics ──
    let metrics = Arc::new(PipelineMetrics::new(config.metrics.enabled)?);

    // ── Request-log pipeline ──
    // The log database is best-effort: when it is disabled or down the
    // server still serves traffic, just without request logging.
    let mut log_state = None;
    if config.log_database.enabled {
        match PgLogSink::connect(&config.log_database).await {
            Ok(sink) => {
                log_state = Some(spawn_pipeline(
                    &config.request_log,
                    Arc::new(sink),
                    Arc::clone(&metrics),
                ));
                info!(
                    queue_capacity = config.request_log.queue_capacity,
                    batch_size = config.request_log.batch_size,
                    flush_interval_ms = config.request_log.flush_interval_ms,
                    "Request-log pipeline started"
                );
            }
            Err(e) => {
                warn!(error = %e, "Log database unavailable, request logging disabled");
            }
        }
    } else {
        info!("Request logging disabled by config");
    }

    // ── Router ──
    let state = AppState {
        books: store.clone(),
        roles: store,
        metrics,
        backend: "postgres",
    };
    let mut app = build_router(state);
    if let Some(log_state) = log_state {
        app = app.layer(middleware::from_fn_with_state(log_state, capture_request));
    }

    // ── Serve ──
    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.addr))?;
    info!(addr = %config.server.addr, "Rolebook is ready — serving traffic");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // No drain path for the log pipeline: buffered records still in the
    // queue or the writer's batch are lost here.
    info!("Rolebook stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    } else {
        info!("Shutdown signal received, stopping...");
    }
}
