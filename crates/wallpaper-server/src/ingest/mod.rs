//! Resumable ingestion of photo collections into the catalog
//!
//! ```text
//! control routes -> IngestEngine -> SourceClient (Unsplash)
//!                        |-> CatalogSink (upsert photos / categories)
//!                        '-> CheckpointStore (stack.json, report.txt)
//! ```

pub mod checkpoint;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod models;
pub mod sink;
pub mod source;
pub mod unsplash;

pub use checkpoint::{CheckpointError, CheckpointStore, FileCheckpointStore};
pub use config::{IngestConfig, UnsplashConfig};
pub use cursor::ProgressCursor;
pub use engine::{
    EngineSettings, EngineState, EngineStatus, EnqueueStatus, IngestEngine, IngestError, RunExit,
    SkipReason, StartStatus, StepOutcome, StopStatus,
};
pub use models::{CatalogEntry, CollectionEntry, SourceCollection, SourcePhoto};
pub use sink::{CatalogSink, MemoryCatalogSink, PgCatalogSink, SinkError};
pub use source::{SourceClient, SourceError};
pub use unsplash::UnsplashClient;
