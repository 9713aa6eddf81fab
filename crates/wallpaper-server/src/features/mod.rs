//! Feature modules implementing the wallpaper API
//!
//! Each feature is a vertical slice with its own routes and, where it reads
//! the store, its own `queries/`.
//!
//! - **control**: start/stop/status of the ingestion run loop
//! - **admin**: source API browsing, queue management, single steps
//! - **catalog**: public paginated listing and full-text search
//!
//! Queries implement `mediator::Request` and expose a `handle(pool, query)`
//! function called by the route handlers.

pub mod admin;
pub mod catalog;
pub mod control;

use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;

use crate::config::AdminConfig;
use crate::ingest::{IngestEngine, SourceClient};

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub engine: IngestEngine,
    pub source: Arc<dyn SourceClient>,
    /// `None` when running against the in-memory sink; the public catalog is
    /// then not mounted
    pub db: Option<sqlx::PgPool>,
    pub admin: AdminConfig,
}

/// Creates the feature router
///
/// - `/start`, `/stop`, `/status` - control surface
/// - `/admin/...` - admin slice, behind the admin gate
/// - `/public/...` - catalog reads (database mode only)
pub fn router(state: FeatureState) -> Router<()> {
    let admin = admin::admin_routes()
        .layer(from_fn_with_state(state.admin.clone(), crate::middleware::require_admin))
        .with_state(admin::AdminState {
            engine: state.engine.clone(),
            source: state.source.clone(),
        });

    let mut router = Router::new()
        .merge(control::control_routes().with_state(state.engine.clone()))
        .nest("/admin", admin);

    if let Some(db) = state.db {
        router = router.nest("/public", catalog::catalog_routes().with_state(db));
    }

    router
}
