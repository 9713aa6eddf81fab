use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::ingest::CollectionEntry;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCategoriesQuery;

#[derive(Debug, thiserror::Error)]
pub enum ListCategoriesError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<CollectionEntry>, ListCategoriesError>> for ListCategoriesQuery {}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    _query: ListCategoriesQuery,
) -> Result<Vec<CollectionEntry>, ListCategoriesError> {
    let categories = sqlx::query_as::<_, CollectionEntry>(
        r#"
        SELECT id, title, cover_photo, blur_hash
        FROM wallpaper_categories
        ORDER BY title ASC, id ASC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(categories)
}
