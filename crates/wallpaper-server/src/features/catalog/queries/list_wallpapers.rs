use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use wallpaper_common::WallpaperError;

use super::{page_offset, PAGE_SIZE, WALLPAPER_COLUMNS};
use crate::ingest::CatalogEntry;

/// Newest wallpapers first, optionally restricted to one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListWallpapersQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub page: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ListWallpapersError {
    #[error(transparent)]
    InvalidPage(#[from] WallpaperError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<CatalogEntry>, ListWallpapersError>> for ListWallpapersQuery {}

impl ListWallpapersQuery {
    pub fn validate(&self) -> Result<(), ListWallpapersError> {
        page_offset(self.page)?;
        Ok(())
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: ListWallpapersQuery,
) -> Result<Vec<CatalogEntry>, ListWallpapersError> {
    query.validate()?;
    let offset = page_offset(query.page)?;

    let sql = format!(
        r#"
        SELECT {WALLPAPER_COLUMNS}
        FROM wallpapers
        WHERE ($1::TEXT IS NULL OR category_id = $1)
        ORDER BY created_at DESC, id ASC
        LIMIT $2 OFFSET $3
        "#
    );

    let wallpapers = sqlx::query_as::<_, CatalogEntry>(&sql)
        .bind(query.category_id.as_deref())
        .bind(PAGE_SIZE)
        .bind(offset)
        .fetch_all(&pool)
        .await?;

    Ok(wallpapers)
}
