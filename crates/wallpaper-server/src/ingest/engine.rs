//! Ingestion engine
//!
//! Walks the queue of collection names one page at a time: resolve the name to
//! a collection, fetch the next page of photos, upsert them, save the cursor.
//! The cursor is saved after every unit of progress, so a restarted process
//! resumes from the last page that was fully written.
//!
//! At most one run loop exists at a time. `start` flips the state from `Idle`
//! to `Running` with a compare-and-swap before spawning the loop; `stop` only
//! raises a flag that the loop observes between pages.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::checkpoint::{CheckpointError, CheckpointStore};
use super::config::IngestConfig;
use super::cursor::ProgressCursor;
use super::models::{CatalogEntry, CollectionEntry};
use super::sink::{CatalogSink, SinkError};
use super::source::{SourceClient, SourceError};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOP_REQUESTED: u8 = 2;

/// Run-loop tuning
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// External API calls allowed per run
    pub api_call_limit: u64,
    /// Consecutive failed attempts at one page tolerated before the run ends
    pub max_page_retries: u32,
    pub retry_delay: Duration,
}

impl From<&IngestConfig> for EngineSettings {
    fn from(config: &IngestConfig) -> Self {
        Self {
            api_call_limit: config.api_call_limit,
            max_page_retries: config.max_page_retries,
            retry_delay: config.retry_delay(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&IngestConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    Running,
    StopRequested,
}

impl EngineState {
    fn from_u8(value: u8) -> Self {
        match value {
            RUNNING => Self::Running,
            STOP_REQUESTED => Self::StopRequested,
            _ => Self::Idle,
        }
    }
}

/// Reply to a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStatus {
    Started,
    AlreadyStarted,
    CollectionOver,
}

impl StartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "Started",
            Self::AlreadyStarted => "Already started",
            Self::CollectionOver => "Collection Over",
        }
    }
}

impl fmt::Display for StartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reply to a stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopStatus {
    Stopping,
    NotRunning,
}

impl StopStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopping => "Stopping",
            Self::NotRunning => "Not running",
        }
    }
}

impl fmt::Display for StopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an admin enqueue request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnqueueStatus {
    Queued { name: String, position: usize },
    AlreadyQueued { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The search returned no collection for the name
    NotFound,
    /// The name resolved to a collection that is already ingested
    AlreadyIngested,
}

/// What one iteration of the run loop did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// A full page was written; more pages follow
    PageStored {
        collection_id: String,
        page: u32,
        photos: usize,
    },
    /// The last page was written and the collection left the queue
    CollectionCompleted {
        collection_id: String,
        page: u32,
        photos: usize,
    },
    /// The queue front was dropped without fetching photos
    Skipped { name: String, reason: SkipReason },
    /// The API call ceiling for this run is reached; nothing was issued
    ApiLimitReached,
    /// The queue is empty
    CollectionOver,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    #[error("Sink write failed: {0}")]
    SinkWriteFailed(#[from] SinkError),

    #[error("Checkpoint I/O failed: {0}")]
    CheckpointIoFailed(#[from] CheckpointError),

    #[error("Invalid collection name: {0:?}")]
    InvalidCollectionName(String),

    #[error("An ingestion run is already active")]
    Busy,
}

impl IngestError {
    /// Source and sink failures leave the cursor untouched, so the same page
    /// can be attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_) | Self::SinkWriteFailed(_))
    }
}

/// Why a run loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunExit {
    CollectionOver,
    ApiLimitReached,
    StopRequested,
    RetriesExhausted,
    CheckpointFailed,
}

impl fmt::Display for RunExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::CollectionOver => "collection over",
            Self::ApiLimitReached => "api call limit reached",
            Self::StopRequested => "stop requested",
            Self::RetriesExhausted => "retries exhausted",
            Self::CheckpointFailed => "checkpoint failure",
        };
        f.write_str(text)
    }
}

/// Point-in-time view of the engine for the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub state: EngineState,
    pub api_call_count: u64,
    pub api_call_limit: u64,
    pub photo_page_index: u32,
    pub pending_collections: Vec<String>,
    pub ingested_collections: usize,
    pub current_collection: Option<String>,
    pub last_exit: Option<RunExit>,
    pub last_error: Option<String>,
}

struct EngineInner {
    state: AtomicU8,
    /// Held for a whole step so the loop and admin writers never interleave
    cursor: Mutex<ProgressCursor>,
    /// Last successfully persisted cursor
    persisted: watch::Sender<ProgressCursor>,
    source: Arc<dyn SourceClient>,
    sink: Arc<dyn CatalogSink>,
    checkpoint: Arc<dyn CheckpointStore>,
    settings: EngineSettings,
    stop_signal: Notify,
    task: Mutex<Option<JoinHandle<RunExit>>>,
    last_exit: Mutex<Option<RunExit>>,
    last_error: Mutex<Option<String>>,
}

/// Handle to the ingestion engine, cheap to clone into HTTP state
#[derive(Clone)]
pub struct IngestEngine {
    inner: Arc<EngineInner>,
}

impl fmt::Debug for IngestEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestEngine")
            .field("state", &self.state())
            .field("settings", &self.inner.settings)
            .finish()
    }
}

impl IngestEngine {
    /// Load the checkpoint and build an idle engine
    ///
    /// A checkpoint that cannot be read is returned as an error: without it
    /// there is no safe place to resume from.
    pub async fn open(
        source: Arc<dyn SourceClient>,
        sink: Arc<dyn CatalogSink>,
        checkpoint: Arc<dyn CheckpointStore>,
        settings: EngineSettings,
    ) -> Result<Self, IngestError> {
        let cursor = checkpoint.load().await?;
        info!(
            pending = cursor.pending_collection_names.len(),
            ingested = cursor.ingested_collections.len(),
            page = cursor.photo_page_index,
            "Checkpoint loaded"
        );

        let (persisted, _) = watch::channel(cursor.clone());
        Ok(Self {
            inner: Arc::new(EngineInner {
                state: AtomicU8::new(IDLE),
                cursor: Mutex::new(cursor),
                persisted,
                source,
                sink,
                checkpoint,
                settings,
                stop_signal: Notify::new(),
                task: Mutex::new(None),
                last_exit: Mutex::new(None),
                last_error: Mutex::new(None),
            }),
        })
    }

    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    /// The cursor as last written to the checkpoint store
    pub fn cursor(&self) -> ProgressCursor {
        self.inner.persisted.borrow().clone()
    }

    /// Spawn the run loop unless one is active or there is nothing to do
    pub async fn start(&self) -> StartStatus {
        if self
            .inner
            .state
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return StartStatus::AlreadyStarted;
        }

        {
            let mut cursor = self.inner.cursor.lock().await;
            if cursor.is_drained() {
                self.inner.state.store(IDLE, Ordering::Release);
                info!("Start requested but the collection queue is empty");
                return StartStatus::CollectionOver;
            }
            cursor.api_call_count = 0;
        }

        *self.inner.last_error.lock().await = None;

        // Held across the spawn so handles are stored in spawn order
        let mut task = self.inner.task.lock().await;
        let engine = self.clone();
        *task = Some(tokio::spawn(async move { engine.run().await }));
        drop(task);

        info!("Ingestion run started");
        StartStatus::Started
    }

    /// Ask the active run to halt after the page it is working on
    pub fn stop(&self) -> StopStatus {
        match self.inner.state.compare_exchange(
            RUNNING,
            STOP_REQUESTED,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                info!("Stop requested");
                self.inner.stop_signal.notify_waiters();
                StopStatus::Stopping
            },
            Err(STOP_REQUESTED) => StopStatus::Stopping,
            Err(_) => StopStatus::NotRunning,
        }
    }

    /// Wait for the spawned run loop, if any, to exit
    pub async fn join(&self) -> Option<RunExit> {
        let handle = self.inner.task.lock().await.take()?;
        match handle.await {
            Ok(exit) => Some(exit),
            Err(e) => {
                error!("Ingestion run task failed: {}", e);
                None
            },
        }
    }

    pub async fn status(&self) -> EngineStatus {
        let cursor = self.cursor();
        EngineStatus {
            state: self.state(),
            api_call_count: cursor.api_call_count,
            api_call_limit: self.inner.settings.api_call_limit,
            photo_page_index: cursor.photo_page_index,
            pending_collections: cursor.pending_collection_names.iter().cloned().collect(),
            ingested_collections: cursor.ingested_collections.len(),
            current_collection: cursor.current_collection.map(|c| c.id),
            last_exit: *self.inner.last_exit.lock().await,
            last_error: self.inner.last_error.lock().await.clone(),
        }
    }

    /// Append a collection name to the back of the queue and persist it
    pub async fn enqueue_collection(&self, name: &str) -> Result<EnqueueStatus, IngestError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IngestError::InvalidCollectionName(name.to_string()));
        }

        let mut cursor = self.inner.cursor.lock().await;
        if !cursor.enqueue(name) {
            return Ok(EnqueueStatus::AlreadyQueued {
                name: name.to_string(),
            });
        }

        if let Err(e) = self.persist(&cursor).await {
            cursor.pending_collection_names.pop_back();
            return Err(e);
        }

        info!(collection_name = name, "Collection queued");
        Ok(EnqueueStatus::Queued {
            name: name.to_string(),
            position: cursor.pending_collection_names.len(),
        })
    }

    /// Run a single step outside of a run loop
    ///
    /// Refused with [`IngestError::Busy`] while a run loop is active. Counts
    /// toward the same API ceiling as the current run.
    pub async fn fetch_next_batch(&self) -> Result<StepOutcome, IngestError> {
        if self
            .inner
            .state
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(IngestError::Busy);
        }

        let result = self.step().await;
        match &result {
            Err(e) if e.is_retryable() => {
                warn!("Single ingestion step failed: {}", e);
                self.report(&format!("{}\nsingle step via the admin API, cursor unchanged", e))
                    .await;
            },
            Err(e) => self.record_failure(e).await,
            Ok(_) => {},
        }

        self.inner.state.store(IDLE, Ordering::Release);
        result
    }

    /// One iteration of the run loop
    ///
    /// On error the cursor is left as it was before the failing call, apart
    /// from the API call count.
    pub async fn step(&self) -> Result<StepOutcome, IngestError> {
        let mut cursor = self.inner.cursor.lock().await;

        let Some(name) = cursor.front().map(str::to_owned) else {
            return Ok(StepOutcome::CollectionOver);
        };

        let collection = match cursor.current_collection.clone() {
            Some(collection) => collection,
            None => {
                if self.limit_reached(&cursor) {
                    return Ok(StepOutcome::ApiLimitReached);
                }
                cursor.record_calls(1);
                let found = self.inner.source.search_collections(&name).await?;

                let Some(first) = found.first() else {
                    warn!(collection_name = %name, "No collection matches the queued name, dropping it");
                    cursor.drop_front();
                    self.persist(&cursor).await?;
                    self.report(&format!("No collection found for \"{}\", removed from the queue", name))
                        .await;
                    return Ok(StepOutcome::Skipped {
                        name,
                        reason: SkipReason::NotFound,
                    });
                };

                let collection = CollectionEntry::from_source(first);
                if cursor.is_ingested(&collection.id) {
                    info!(
                        collection_name = %name,
                        collection_id = %collection.id,
                        "Collection already ingested, dropping duplicate queue entry"
                    );
                    cursor.drop_front();
                    self.persist(&cursor).await?;
                    return Ok(StepOutcome::Skipped {
                        name,
                        reason: SkipReason::AlreadyIngested,
                    });
                }

                self.inner.sink.upsert_collection(&collection).await?;
                cursor.current_collection = Some(collection.clone());
                self.persist(&cursor).await?;
                info!(collection_name = %name, collection_id = %collection.id, "Resolved collection");
                collection
            },
        };

        if self.limit_reached(&cursor) {
            return Ok(StepOutcome::ApiLimitReached);
        }

        let page = cursor.photo_page_index;
        cursor.record_calls(1);
        let photos = self
            .inner
            .source
            .collection_photos(&collection.id, page + 1)
            .await?;

        let entries: Vec<CatalogEntry> = photos
            .iter()
            .map(|photo| CatalogEntry::from_source(photo, &collection.id))
            .collect();
        if !entries.is_empty() {
            self.inner.sink.upsert_photos(&entries).await?;
        }

        let count = entries.len();
        let last_page = count < self.inner.source.per_page() as usize;
        let outcome = if last_page {
            cursor.complete_front(collection.clone());
            StepOutcome::CollectionCompleted {
                collection_id: collection.id,
                page,
                photos: count,
            }
        } else {
            cursor.advance_page();
            StepOutcome::PageStored {
                collection_id: collection.id,
                page,
                photos: count,
            }
        };

        self.persist(&cursor).await?;
        debug!(?outcome, api_calls = cursor.api_call_count, "Step finished");
        Ok(outcome)
    }

    async fn run(self) -> RunExit {
        let exit = self.run_loop().await;

        let api_calls = self.cursor().api_call_count;
        info!(%exit, api_calls, "Ingestion run ended");
        self.report(&format!("Ingestion run ended: {} (apiCount {})", exit, api_calls))
            .await;

        *self.inner.last_exit.lock().await = Some(exit);
        self.inner.state.store(IDLE, Ordering::Release);
        exit
    }

    async fn run_loop(&self) -> RunExit {
        {
            let cursor = self.inner.cursor.lock().await;
            if let Err(e) = self.persist(&cursor).await {
                self.record_failure(&e).await;
                return RunExit::CheckpointFailed;
            }
        }

        let mut failures: u32 = 0;
        loop {
            if self.stop_requested() {
                return RunExit::StopRequested;
            }

            match self.step().await {
                Ok(StepOutcome::CollectionOver) => return RunExit::CollectionOver,
                Ok(StepOutcome::ApiLimitReached) => return RunExit::ApiLimitReached,
                Ok(outcome) => {
                    failures = 0;
                    debug!(?outcome, "Progress saved");
                },
                Err(e) if e.is_retryable() => {
                    failures += 1;
                    warn!(attempt = failures, "Ingestion step failed: {}", e);
                    self.report(&format!("{}\nattempt {} of the current page", e, failures))
                        .await;

                    if failures > self.inner.settings.max_page_retries {
                        self.record_failure(&e).await;
                        return RunExit::RetriesExhausted;
                    }
                    if !self.pause().await {
                        return RunExit::StopRequested;
                    }
                },
                Err(e) => {
                    self.record_failure(&e).await;
                    return RunExit::CheckpointFailed;
                },
            }
        }
    }

    /// Sleep between retries; `false` when a stop arrived meanwhile
    ///
    /// The waiter is registered before the state is checked, so a stop issued
    /// between the check and the sleep still wakes it. `stop` only wakes
    /// registered waiters and leaves no permit behind for a later run.
    async fn pause(&self) -> bool {
        let notified = self.inner.stop_signal.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.stop_requested() {
            return false;
        }

        tokio::select! {
            _ = tokio::time::sleep(self.inner.settings.retry_delay) => {},
            _ = notified => {},
        }
        !self.stop_requested()
    }

    fn stop_requested(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == STOP_REQUESTED
    }

    fn limit_reached(&self, cursor: &ProgressCursor) -> bool {
        cursor.api_call_count >= self.inner.settings.api_call_limit
    }

    async fn persist(&self, cursor: &ProgressCursor) -> Result<(), IngestError> {
        self.inner.checkpoint.save(cursor).await?;
        self.inner.persisted.send_replace(cursor.clone());
        Ok(())
    }

    async fn record_failure(&self, e: &IngestError) {
        error!("Ingestion failed: {}", e);
        *self.inner.last_error.lock().await = Some(e.to_string());
        self.report(&format!("Ingestion halted: {}", e)).await;
    }

    /// Report failures never interrupt ingestion
    async fn report(&self, text: &str) {
        if let Err(e) = self.inner.checkpoint.append_report(text).await {
            warn!("Failed to append run report: {}", e);
        }
    }
}
