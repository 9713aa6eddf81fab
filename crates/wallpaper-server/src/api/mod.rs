//! Application router: feature slices, health check and the middleware stack

use axum::{routing::get, Router};
use tower_http::compression::CompressionLayer;

use crate::config::CorsConfig;
use crate::features::{self, FeatureState};
use crate::middleware;

/// Body of the health check, kept for existing uptime probes
pub const HEALTH_MESSAGE: &str = "Server is working";

pub fn create_router(state: FeatureState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/", get(health))
        .merge(features::router(state))
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(cors))
}

async fn health() -> &'static str {
    HEALTH_MESSAGE
}
