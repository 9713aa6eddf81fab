//! Admin gate
//!
//! Admin routes reach the external API quota and mutate the work queue, so
//! they are only served when `ADMIN_ENABLED=true`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::AdminConfig;
use crate::error::{AppError, ADMIN_FORBIDDEN_MESSAGE};

/// Use with `axum::middleware::from_fn_with_state(admin_config, require_admin)`
pub async fn require_admin(
    State(admin): State<AdminConfig>,
    request: Request,
    next: Next,
) -> Response {
    if !admin.enabled {
        tracing::warn!(path = %request.uri().path(), "Rejected admin request");
        return AppError::Forbidden(ADMIN_FORBIDDEN_MESSAGE.to_string()).into_response();
    }

    next.run(request).await
}
