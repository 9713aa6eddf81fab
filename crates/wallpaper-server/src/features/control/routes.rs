//! Control routes
//!
//! `start` and `stop` answer with a fixed plain-text status and never block on
//! the run loop. Failures are only visible through `status` and the run report.

use axum::{extract::State, routing::get, Json, Router};

use crate::ingest::{EngineStatus, IngestEngine};

pub fn control_routes() -> Router<IngestEngine> {
    Router::new()
        .route("/start", get(start))
        .route("/stop", get(stop))
        .route("/status", get(status))
}

async fn start(State(engine): State<IngestEngine>) -> &'static str {
    let status = engine.start().await;
    tracing::info!(%status, "Start requested via API");
    status.as_str()
}

async fn stop(State(engine): State<IngestEngine>) -> &'static str {
    let status = engine.stop();
    tracing::info!(%status, "Stop requested via API");
    status.as_str()
}

async fn status(State(engine): State<IngestEngine>) -> Json<EngineStatus> {
    Json(engine.status().await)
}
