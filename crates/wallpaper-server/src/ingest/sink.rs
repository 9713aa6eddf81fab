//! Catalog sink
//!
//! Idempotent writes of mapped records into the document store. Every write is
//! an upsert keyed by the external id, so delivering the same page twice leaves
//! exactly one row per photo.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

use super::models::{CatalogEntry, CollectionEntry};

/// Rows per INSERT statement, well below the Postgres bind parameter limit
const PHOTO_CHUNK_SIZE: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Write side of the catalog
#[async_trait]
pub trait CatalogSink: Send + Sync {
    /// Create or replace every photo by id; all-or-nothing
    async fn upsert_photos(&self, photos: &[CatalogEntry]) -> Result<u64, SinkError>;

    /// Create or replace one category by id
    async fn upsert_collection(&self, collection: &CollectionEntry) -> Result<(), SinkError>;
}

/// Keep the last occurrence of each id. Postgres refuses to update the same
/// row twice within one `ON CONFLICT DO UPDATE` statement.
fn dedup_by_id(photos: &[CatalogEntry]) -> Vec<&CatalogEntry> {
    let mut seen = HashSet::new();
    let mut unique: Vec<&CatalogEntry> = photos
        .iter()
        .rev()
        .filter(|photo| seen.insert(photo.id.as_str()))
        .collect();
    unique.reverse();
    unique
}

/// PostgreSQL-backed sink
#[derive(Debug, Clone)]
pub struct PgCatalogSink {
    pool: PgPool,
}

impl PgCatalogSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogSink for PgCatalogSink {
    async fn upsert_photos(&self, photos: &[CatalogEntry]) -> Result<u64, SinkError> {
        let photos = dedup_by_id(photos);
        if photos.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut affected = 0;

        for chunk in photos.chunks(PHOTO_CHUNK_SIZE) {
            let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
                r#"
                INSERT INTO wallpapers (
                    id, category_id, created_at, width, height, color,
                    blur_hash, description, image_url, likes, is_premium
                )
                "#,
            );

            query_builder.push_values(chunk, |mut b, photo| {
                b.push_bind(&photo.id)
                    .push_bind(&photo.category_id)
                    .push_bind(photo.created_at)
                    .push_bind(photo.width)
                    .push_bind(photo.height)
                    .push_bind(&photo.color)
                    .push_bind(&photo.blur_hash)
                    .push_bind(&photo.description)
                    .push_bind(&photo.image_url)
                    .push_bind(photo.likes)
                    .push_bind(photo.is_premium);
            });

            query_builder.push(
                r#"
                ON CONFLICT (id)
                DO UPDATE SET
                    category_id = EXCLUDED.category_id,
                    created_at = EXCLUDED.created_at,
                    width = EXCLUDED.width,
                    height = EXCLUDED.height,
                    color = EXCLUDED.color,
                    blur_hash = EXCLUDED.blur_hash,
                    description = EXCLUDED.description,
                    image_url = EXCLUDED.image_url,
                    likes = EXCLUDED.likes,
                    is_premium = EXCLUDED.is_premium,
                    updated_at = NOW()
                "#,
            );

            let result = query_builder.build().execute(&mut *tx).await?;
            affected += result.rows_affected();
        }

        tx.commit().await?;
        debug!(photos = affected, "Upserted wallpapers");
        Ok(affected)
    }

    async fn upsert_collection(&self, collection: &CollectionEntry) -> Result<(), SinkError> {
        sqlx::query(
            r#"
            INSERT INTO wallpaper_categories (id, title, cover_photo, blur_hash)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id)
            DO UPDATE SET
                title = EXCLUDED.title,
                cover_photo = EXCLUDED.cover_photo,
                blur_hash = EXCLUDED.blur_hash,
                updated_at = NOW()
            "#,
        )
        .bind(&collection.id)
        .bind(&collection.title)
        .bind(&collection.cover_photo)
        .bind(&collection.blur_hash)
        .execute(&self.pool)
        .await?;

        debug!(collection_id = %collection.id, "Upserted category");
        Ok(())
    }
}

/// In-process sink keyed like the database tables
///
/// Backs the `--memory-sink` dry-run mode and the engine tests.
#[derive(Debug, Default)]
pub struct MemoryCatalogSink {
    photos: RwLock<BTreeMap<String, CatalogEntry>>,
    collections: RwLock<BTreeMap<String, CollectionEntry>>,
}

impl MemoryCatalogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn photos(&self) -> Vec<CatalogEntry> {
        self.photos.read().await.values().cloned().collect()
    }

    pub async fn collections(&self) -> Vec<CollectionEntry> {
        self.collections.read().await.values().cloned().collect()
    }

    pub async fn photo_count(&self) -> usize {
        self.photos.read().await.len()
    }
}

#[async_trait]
impl CatalogSink for MemoryCatalogSink {
    async fn upsert_photos(&self, photos: &[CatalogEntry]) -> Result<u64, SinkError> {
        let mut stored = self.photos.write().await;
        for photo in photos {
            stored.insert(photo.id.clone(), photo.clone());
        }
        Ok(photos.len() as u64)
    }

    async fn upsert_collection(&self, collection: &CollectionEntry) -> Result<(), SinkError> {
        self.collections
            .write()
            .await
            .insert(collection.id.clone(), collection.clone());
        Ok(())
    }
}
