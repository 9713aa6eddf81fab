//! Persisted ingestion progress
//!
//! The JSON keys (`apiCount`, `photoIndex`, `categoriesName`, `collections`)
//! are shared with checkpoint files written by earlier deployments and must not
//! change. `currentCollection` is optional and may be missing from old files.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::models::CollectionEntry;

/// Where ingestion resumes after a restart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCursor {
    /// External API requests issued during the current run
    #[serde(rename = "apiCount", default)]
    pub api_call_count: u64,

    /// Next page (0-based) of the collection at the front of the queue
    #[serde(rename = "photoIndex", default)]
    pub photo_page_index: u32,

    /// Collection names waiting to be ingested, consumed from the front
    #[serde(rename = "categoriesName", default)]
    pub pending_collection_names: VecDeque<String>,

    /// Collections that have been fully paginated
    #[serde(rename = "collections", default)]
    pub ingested_collections: Vec<CollectionEntry>,

    /// Collection the queue front resolved to, once known
    #[serde(
        rename = "currentCollection",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_collection: Option<CollectionEntry>,
}

impl ProgressCursor {
    pub fn front(&self) -> Option<&str> {
        self.pending_collection_names.front().map(String::as_str)
    }

    /// Nothing queued, so a run has no work
    pub fn is_drained(&self) -> bool {
        self.pending_collection_names.is_empty()
    }

    pub fn is_ingested(&self, collection_id: &str) -> bool {
        self.ingested_collections
            .iter()
            .any(|collection| collection.id == collection_id)
    }

    /// Append a name to the back of the queue; `false` if it is already queued
    pub fn enqueue(&mut self, name: &str) -> bool {
        if self.pending_collection_names.iter().any(|queued| queued == name) {
            return false;
        }
        self.pending_collection_names.push_back(name.to_string());
        true
    }

    pub fn record_calls(&mut self, calls: u64) {
        self.api_call_count = self.api_call_count.saturating_add(calls);
    }

    pub fn advance_page(&mut self) {
        self.photo_page_index += 1;
    }

    /// Mark `collection` ingested and move on to the next queued name
    pub fn complete_front(&mut self, collection: CollectionEntry) {
        if !self.is_ingested(&collection.id) {
            self.ingested_collections.push(collection);
        }
        self.drop_front();
    }

    /// Remove the queue front without ingesting anything for it
    pub fn drop_front(&mut self) {
        self.pending_collection_names.pop_front();
        self.photo_page_index = 0;
        self.current_collection = None;
    }
}
