//! Wallpaper Server - Main entry point

use anyhow::{Context, Result};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::{info, warn};
use wallpaper_common::logging::{init_logging, LogConfig};

use wallpaper_server::{
    api,
    config::Config,
    features::FeatureState,
    ingest::{
        CatalogSink, EngineSettings, FileCheckpointStore, IngestEngine, MemoryCatalogSink,
        PgCatalogSink, UnsplashClient,
    },
};

#[derive(Debug, Parser)]
#[command(name = "wallpaper-server", version, about = "Wallpaper catalog ingestion server")]
struct Args {
    /// Write ingested records to an in-memory sink instead of PostgreSQL.
    /// The public catalog routes are not mounted in this mode.
    #[arg(long, env = "WALLPAPER_MEMORY_SINK")]
    memory_sink: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging with configuration from environment
    let log_config = LogConfig::builder()
        .log_file_prefix("wallpaper-server")
        .filter_directives("wallpaper_server=debug,tower_http=debug,sqlx=warn")
        .build();

    // Environment variables take precedence over the values above
    let log_config = log_config.merge_env()?;

    init_logging(&log_config)?;

    info!("Starting Wallpaper Server");

    let config = Config::load()?;
    info!("Configuration loaded - server will bind to {}", config.bind_address());

    let (sink, db): (Arc<dyn CatalogSink>, Option<sqlx::PgPool>) = if args.memory_sink {
        warn!("Using the in-memory catalog sink; ingested records are not persisted");
        (Arc::new(MemoryCatalogSink::new()), None)
    } else {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.database.idle_timeout_secs))
            .connect(&config.database.url)
            .await?;

        info!("Database connection pool established");

        sqlx::migrate!("../../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

        info!("Database migrations completed");
        (Arc::new(PgCatalogSink::new(db_pool.clone())), Some(db_pool))
    };

    let source = Arc::new(
        UnsplashClient::new(&config.ingest.unsplash)
            .context("Failed to build the Unsplash client")?,
    );

    let report_offset = config
        .ingest
        .report_offset()
        .context("Invalid INGEST_REPORT_UTC_OFFSET_MINUTES")?;
    let checkpoint = Arc::new(FileCheckpointStore::new(
        &config.ingest.checkpoint_dir,
        report_offset,
    ));

    // A checkpoint that cannot be read leaves no safe resume point
    let engine = IngestEngine::open(
        source.clone(),
        sink,
        checkpoint,
        EngineSettings::from(&config.ingest),
    )
    .await
    .context("Failed to load the ingestion checkpoint")?;

    if config.ingest.autostart {
        info!("Autostart: {}", engine.start().await);
    }

    let state = FeatureState {
        engine: engine.clone(),
        source,
        db,
        admin: config.admin.clone(),
    };
    let app = api::create_router(state, &config.cors);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let the run loop finish its current page and save the checkpoint
    engine.stop();
    let timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    match tokio::time::timeout(timeout, engine.join()).await {
        Ok(Some(exit)) => info!("Ingestion run finished: {}", exit),
        Ok(None) => {},
        Err(_) => warn!("Ingestion run did not stop within {} seconds", timeout.as_secs()),
    }

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
