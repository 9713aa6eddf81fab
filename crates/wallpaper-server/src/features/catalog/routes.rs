//! Public catalog routes
//!
//! - `GET /public/category` - every category
//! - `GET /public/getAllWallpapers?page=N` - newest wallpapers, 30 per page
//! - `GET /public/wallpapers?id=<category>&page=N` - newest wallpapers of one category
//! - `GET /public/wallpaper/:id` - a single wallpaper
//! - `GET /public/wallpaper/search/:query/:page` - full-text search
//!
//! List endpoints answer with a bare JSON array, as existing clients expect.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use sqlx::PgPool;

use super::queries::{
    get_wallpaper, list_categories, list_wallpapers, search_wallpapers, GetWallpaperError,
    GetWallpaperQuery, ListCategoriesError, ListCategoriesQuery, ListWallpapersError,
    ListWallpapersQuery, SearchWallpapersError, SearchWallpapersQuery,
};
use crate::error::AppError;
use crate::ingest::{CatalogEntry, CollectionEntry};

pub fn catalog_routes() -> Router<PgPool> {
    Router::new()
        .route("/category", get(list_categories_handler))
        .route("/getAllWallpapers", get(list_all_wallpapers))
        .route("/wallpapers", get(list_category_wallpapers))
        .route("/wallpaper/:id", get(get_wallpaper_handler))
        .route("/wallpaper/search/:query/:page", get(search_wallpapers_handler))
}

fn first_page() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
struct PageParams {
    #[serde(default = "first_page")]
    page: i64,
}

#[derive(Debug, Deserialize)]
struct CategoryPageParams {
    id: String,
    #[serde(default = "first_page")]
    page: i64,
}

async fn list_categories_handler(
    State(pool): State<PgPool>,
) -> Result<Json<Vec<CollectionEntry>>, AppError> {
    let categories = list_categories::handle(pool, ListCategoriesQuery).await?;
    Ok(Json(categories))
}

#[tracing::instrument(skip(pool))]
async fn list_all_wallpapers(
    State(pool): State<PgPool>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<CatalogEntry>>, AppError> {
    let query = ListWallpapersQuery {
        category_id: None,
        page: params.page,
    };
    Ok(Json(list_wallpapers::handle(pool, query).await?))
}

#[tracing::instrument(skip(pool))]
async fn list_category_wallpapers(
    State(pool): State<PgPool>,
    Query(params): Query<CategoryPageParams>,
) -> Result<Json<Vec<CatalogEntry>>, AppError> {
    let query = ListWallpapersQuery {
        category_id: Some(params.id),
        page: params.page,
    };
    Ok(Json(list_wallpapers::handle(pool, query).await?))
}

async fn get_wallpaper_handler(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<Json<CatalogEntry>, AppError> {
    let wallpaper = get_wallpaper::handle(pool, GetWallpaperQuery { id }).await?;
    Ok(Json(wallpaper))
}

#[tracing::instrument(skip(pool))]
async fn search_wallpapers_handler(
    State(pool): State<PgPool>,
    Path((query, page)): Path<(String, i64)>,
) -> Result<Json<Vec<CatalogEntry>>, AppError> {
    let query = SearchWallpapersQuery { query, page };
    Ok(Json(search_wallpapers::handle(pool, query).await?))
}

// ============================================================================
// Error Handling
// ============================================================================

impl From<ListCategoriesError> for AppError {
    fn from(err: ListCategoriesError) -> Self {
        match err {
            ListCategoriesError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<ListWallpapersError> for AppError {
    fn from(err: ListWallpapersError) -> Self {
        match err {
            ListWallpapersError::InvalidPage(e) => e.into(),
            ListWallpapersError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<GetWallpaperError> for AppError {
    fn from(err: GetWallpaperError) -> Self {
        match err {
            GetWallpaperError::NotFound(_) => AppError::NotFound(err.to_string()),
            GetWallpaperError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<SearchWallpapersError> for AppError {
    fn from(err: SearchWallpapersError) -> Self {
        match err {
            SearchWallpapersError::EmptyQuery => AppError::BadRequest(err.to_string()),
            SearchWallpapersError::InvalidPage(e) => e.into(),
            SearchWallpapersError::Database(e) => AppError::Database(e),
        }
    }
}
