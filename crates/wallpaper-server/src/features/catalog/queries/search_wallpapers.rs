use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use wallpaper_common::WallpaperError;

use super::{page_offset, PAGE_SIZE, WALLPAPER_COLUMNS};
use crate::ingest::CatalogEntry;

/// Full-text search over wallpaper descriptions and colors, best match first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchWallpapersQuery {
    pub query: String,
    pub page: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchWallpapersError {
    #[error("Search query cannot be empty")]
    EmptyQuery,
    #[error(transparent)]
    InvalidPage(#[from] WallpaperError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<CatalogEntry>, SearchWallpapersError>> for SearchWallpapersQuery {}

impl SearchWallpapersQuery {
    pub fn validate(&self) -> Result<(), SearchWallpapersError> {
        if self.query.trim().is_empty() {
            return Err(SearchWallpapersError::EmptyQuery);
        }
        page_offset(self.page)?;
        Ok(())
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: SearchWallpapersQuery,
) -> Result<Vec<CatalogEntry>, SearchWallpapersError> {
    query.validate()?;
    let offset = page_offset(query.page)?;

    let sql = format!(
        r#"
        SELECT {WALLPAPER_COLUMNS}
        FROM wallpapers
        WHERE search_vector @@ websearch_to_tsquery('english', $1)
        ORDER BY ts_rank(search_vector, websearch_to_tsquery('english', $1)) DESC,
                 created_at DESC
        LIMIT $2 OFFSET $3
        "#
    );

    let wallpapers = sqlx::query_as::<_, CatalogEntry>(&sql)
        .bind(query.query.trim())
        .bind(PAGE_SIZE)
        .bind(offset)
        .fetch_all(&pool)
        .await?;

    tracing::debug!(results = wallpapers.len(), "Wallpaper search finished");
    Ok(wallpapers)
}
