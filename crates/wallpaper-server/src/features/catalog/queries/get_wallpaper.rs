use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::WALLPAPER_COLUMNS;
use crate::ingest::CatalogEntry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetWallpaperQuery {
    pub id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GetWallpaperError {
    #[error("Wallpaper '{0}' not found")]
    NotFound(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<CatalogEntry, GetWallpaperError>> for GetWallpaperQuery {}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: GetWallpaperQuery) -> Result<CatalogEntry, GetWallpaperError> {
    let sql = format!("SELECT {WALLPAPER_COLUMNS} FROM wallpapers WHERE id = $1");

    let wallpaper = sqlx::query_as::<_, CatalogEntry>(&sql)
        .bind(&query.id)
        .fetch_optional(&pool)
        .await?;

    wallpaper.ok_or(GetWallpaperError::NotFound(query.id))
}
