//! Wallpaper Server Library
//!
//! Resumable ingestion of Unsplash photo collections into a wallpaper catalog,
//! plus the HTTP surface around it.
//!
//! # Overview
//!
//! - **Ingestion** ([`ingest`]): a single background run loop walks a queue of
//!   collection names page by page, upserts photos into the catalog and saves a
//!   checkpoint after every page, so a restart resumes where it stopped.
//! - **Control**: `GET /start`, `GET /stop`, `GET /status`.
//! - **Admin**: source browsing and queue management, refused unless
//!   `ADMIN_ENABLED=true`.
//! - **Public catalog**: paginated listing and full-text search over
//!   PostgreSQL.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wallpaper_server::ingest::{
//!     EngineSettings, FileCheckpointStore, IngestEngine, MemoryCatalogSink, UnsplashClient,
//! };
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = wallpaper_server::config::Config::load()?;
//! let offset = config.ingest.report_offset().ok_or_else(|| anyhow::anyhow!("bad offset"))?;
//! let engine = IngestEngine::open(
//!     Arc::new(UnsplashClient::new(&config.ingest.unsplash)?),
//!     Arc::new(MemoryCatalogSink::new()),
//!     Arc::new(FileCheckpointStore::new(&config.ingest.checkpoint_dir, offset)),
//!     EngineSettings::from(&config.ingest),
//! )
//! .await?;
//! println!("{}", engine.start().await);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;

// Re-export commonly used types
pub use error::AppError;
