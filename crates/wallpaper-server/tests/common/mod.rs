//! Common test utilities for wallpaper server integration tests
//!
//! In-process fakes for the three collaborators of the ingestion engine:
//!
//! - [`FakeSource`]: scripted collections and photo pages, call log, failure
//!   injection and an optional gate that holds page requests
//! - [`FlakySink`]: a [`MemoryCatalogSink`] that fails the first N photo writes
//! - [`MemoryCheckpointStore`]: checkpoint and report kept in memory, with
//!   switchable save failures or failures after a number of saves

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

use wallpaper_server::ingest::{
    CatalogEntry, CatalogSink, CheckpointError, CheckpointStore, CollectionEntry, EngineSettings,
    IngestEngine, MemoryCatalogSink, ProgressCursor, SinkError, SourceClient, SourceCollection,
    SourceError, SourcePhoto,
};

pub fn photo(id: &str) -> SourcePhoto {
    SourcePhoto {
        id: id.to_string(),
        width: 1080,
        height: 1920,
        description: Some(format!("photo {}", id)),
        ..Default::default()
    }
}

pub fn collection(id: &str, title: &str) -> SourceCollection {
    SourceCollection {
        id: id.to_string(),
        title: title.to_string(),
        ..Default::default()
    }
}

/// Engine settings suited to tests: no real waiting between retries
pub fn fast_settings() -> EngineSettings {
    EngineSettings {
        api_call_limit: 1_000,
        max_page_retries: 3,
        retry_delay: Duration::from_millis(5),
    }
}

/// Poll `condition` until it holds, failing the test after two seconds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

// ============================================================================
// Source
// ============================================================================

#[derive(Default)]
pub struct FakeSource {
    per_page: u32,
    collections: HashMap<String, Vec<SourceCollection>>,
    /// Pages per collection id, index 0 is page 1
    pages: HashMap<String, Vec<Vec<SourcePhoto>>>,
    page_calls: Mutex<Vec<(String, u32)>>,
    search_calls: Mutex<Vec<String>>,
    failing_page_calls: AtomicU32,
    gate: Option<Arc<Semaphore>>,
}

impl FakeSource {
    pub fn new(per_page: u32) -> Self {
        Self {
            per_page,
            ..Default::default()
        }
    }

    pub fn with_collection(mut self, name: &str, found: SourceCollection) -> Self {
        self.collections.entry(name.to_string()).or_default().push(found);
        self
    }

    pub fn with_pages(mut self, collection_id: &str, pages: Vec<Vec<SourcePhoto>>) -> Self {
        self.pages.insert(collection_id.to_string(), pages);
        self
    }

    /// `n` full pages of generated photos, then one page with `last` photos
    pub fn with_generated_pages(self, collection_id: &str, n: usize, last: usize) -> Self {
        let per_page = self.per_page as usize;
        let mut pages: Vec<Vec<SourcePhoto>> = (0..n)
            .map(|p| {
                (0..per_page)
                    .map(|i| photo(&format!("{}-{}-{}", collection_id, p, i)))
                    .collect()
            })
            .collect();
        pages.push(
            (0..last)
                .map(|i| photo(&format!("{}-{}-{}", collection_id, n, i)))
                .collect(),
        );
        self.with_pages(collection_id, pages)
    }

    /// Page requests wait for a permit from the returned semaphore
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn fail_next_page_calls(&self, n: u32) {
        self.failing_page_calls.store(n, Ordering::SeqCst);
    }

    pub fn page_calls(&self) -> Vec<(String, u32)> {
        self.page_calls.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceClient for FakeSource {
    async fn search_collections(&self, name: &str) -> Result<Vec<SourceCollection>, SourceError> {
        self.search_calls.lock().unwrap().push(name.to_string());
        Ok(self.collections.get(name).cloned().unwrap_or_default())
    }

    async fn collection_photos(
        &self,
        collection_id: &str,
        page: u32,
    ) -> Result<Vec<SourcePhoto>, SourceError> {
        self.page_calls
            .lock()
            .unwrap()
            .push((collection_id.to_string(), page));

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let failing = self.failing_page_calls.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_page_calls.store(failing - 1, Ordering::SeqCst);
            return Err(SourceError::RateLimited { status: 429 });
        }

        Ok(self
            .pages
            .get(collection_id)
            .and_then(|pages| pages.get(page as usize - 1))
            .cloned()
            .unwrap_or_default())
    }

    async fn latest_collections(&self) -> Result<Vec<SourceCollection>, SourceError> {
        Ok(self.collections.values().flatten().cloned().collect())
    }

    fn per_page(&self) -> u32 {
        self.per_page
    }
}

// ============================================================================
// Sink
// ============================================================================

#[derive(Default)]
pub struct FlakySink {
    pub inner: MemoryCatalogSink,
    failures_left: AtomicU32,
    pub photo_writes: AtomicU32,
}

impl FlakySink {
    pub fn failing(n: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(n),
            ..Default::default()
        }
    }
}

#[async_trait]
impl CatalogSink for FlakySink {
    async fn upsert_photos(&self, photos: &[CatalogEntry]) -> Result<u64, SinkError> {
        self.photo_writes.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(SinkError::Unavailable("connection reset".to_string()));
        }
        self.inner.upsert_photos(photos).await
    }

    async fn upsert_collection(&self, collection: &CollectionEntry) -> Result<(), SinkError> {
        self.inner.upsert_collection(collection).await
    }
}

// ============================================================================
// Checkpoint
// ============================================================================

#[derive(Default)]
pub struct MemoryCheckpointStore {
    cursor: Mutex<Option<ProgressCursor>>,
    reports: Mutex<Vec<String>>,
    saves: AtomicU32,
    fail_saves: AtomicBool,
    /// Saves fail once this many have succeeded
    fail_after: Mutex<Option<u32>>,
    fail_load: AtomicBool,
}

impl MemoryCheckpointStore {
    pub fn with_cursor(cursor: ProgressCursor) -> Self {
        Self {
            cursor: Mutex::new(Some(cursor)),
            ..Default::default()
        }
    }

    pub fn unreadable() -> Self {
        let store = Self::default();
        store.fail_load.store(true, Ordering::SeqCst);
        store
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
        if !fail {
            *self.fail_after.lock().unwrap() = None;
        }
    }

    pub fn fail_saves_after(&self, successful: u32) {
        *self.fail_after.lock().unwrap() = Some(successful);
    }

    pub fn stored(&self) -> Option<ProgressCursor> {
        self.cursor.lock().unwrap().clone()
    }

    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().unwrap().clone()
    }

    pub fn saves(&self) -> u32 {
        self.saves.load(Ordering::SeqCst)
    }
}

fn io_error(message: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::PermissionDenied, message.to_string())
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self) -> Result<ProgressCursor, CheckpointError> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(CheckpointError::Read {
                path: "memory".into(),
                source: io_error("unreadable"),
            });
        }
        let mut stored = self.cursor.lock().unwrap();
        Ok(stored.get_or_insert_with(ProgressCursor::default).clone())
    }

    async fn save(&self, cursor: &ProgressCursor) -> Result<(), CheckpointError> {
        let exhausted = self
            .fail_after
            .lock()
            .unwrap()
            .is_some_and(|n| self.saves.load(Ordering::SeqCst) >= n);
        if self.fail_saves.load(Ordering::SeqCst) || exhausted {
            return Err(CheckpointError::Write {
                path: "memory".into(),
                source: io_error("disk full"),
            });
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.cursor.lock().unwrap() = Some(cursor.clone());
        Ok(())
    }

    async fn append_report(&self, text: &str) -> Result<(), CheckpointError> {
        self.reports.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

pub fn queued(names: &[&str]) -> ProgressCursor {
    let mut cursor = ProgressCursor::default();
    for name in names {
        cursor.enqueue(name);
    }
    cursor
}

pub async fn open_engine(
    source: Arc<FakeSource>,
    sink: Arc<dyn CatalogSink>,
    checkpoint: Arc<MemoryCheckpointStore>,
    settings: EngineSettings,
) -> IngestEngine {
    IngestEngine::open(source, sink, checkpoint, settings)
        .await
        .unwrap()
}
