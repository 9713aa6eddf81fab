//! Contract of the external photo-collection API
//!
//! Implementations issue exactly one request per call and never retry; the
//! ingestion engine owns the retry policy.

use async_trait::async_trait;

use super::models::{SourceCollection, SourcePhoto};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Rate limit exceeded (HTTP {status})")]
    RateLimited { status: u16 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// Read access to the photo-collection API
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Collections matching `name`, best match first
    async fn search_collections(&self, name: &str) -> Result<Vec<SourceCollection>, SourceError>;

    /// One page (1-based) of a collection's photos, `per_page()` at most
    async fn collection_photos(
        &self,
        collection_id: &str,
        page: u32,
    ) -> Result<Vec<SourcePhoto>, SourceError>;

    /// Most recently published collections
    async fn latest_collections(&self) -> Result<Vec<SourceCollection>, SourceError>;

    /// Page size used for `collection_photos`; a shorter page is the last one
    fn per_page(&self) -> u32;
}
