//! Admin routes
//!
//! Mounted behind [`crate::middleware::require_admin`], which answers 403 on
//! deployments where `ADMIN_ENABLED` is not set.
//!
//! - `GET /admin/collections/:name` - search source collections by name
//! - `GET /admin/collections/photos/:id` - first page of a collection's photos
//! - `GET /admin/latest` - latest source collections
//! - `GET /admin/add/collections/:name` - queue a collection name for ingestion
//! - `GET /admin/photos` - run one ingestion step now

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::ingest::{
    EnqueueStatus, IngestEngine, SourceClient, SourceCollection, SourcePhoto, StepOutcome,
};

#[derive(Clone)]
pub struct AdminState {
    pub engine: IngestEngine,
    pub source: Arc<dyn SourceClient>,
}

pub fn admin_routes() -> Router<AdminState> {
    Router::new()
        .route("/collections/:name", get(search_collections))
        .route("/collections/photos/:id", get(collection_photos))
        .route("/latest", get(latest_collections))
        .route("/add/collections/:name", get(enqueue_collection))
        .route("/photos", get(next_batch))
}

async fn search_collections(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<SourceCollection>>, AppError> {
    Ok(Json(state.source.search_collections(&name).await?))
}

async fn collection_photos(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<SourcePhoto>>, AppError> {
    Ok(Json(state.source.collection_photos(&id, 1).await?))
}

async fn latest_collections(
    State(state): State<AdminState>,
) -> Result<Json<Vec<SourceCollection>>, AppError> {
    Ok(Json(state.source.latest_collections().await?))
}

#[tracing::instrument(skip(state))]
async fn enqueue_collection(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> Result<Json<EnqueueStatus>, AppError> {
    Ok(Json(state.engine.enqueue_collection(&name).await?))
}

async fn next_batch(State(state): State<AdminState>) -> Result<Json<StepOutcome>, AppError> {
    let outcome = state.engine.fetch_next_batch().await?;
    tracing::info!(?outcome, "Single ingestion step via API");
    Ok(Json(outcome))
}
