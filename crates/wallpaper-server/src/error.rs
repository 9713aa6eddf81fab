//! Server-specific error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use wallpaper_common::WallpaperError;

use crate::ingest::{IngestError, SourceError};

/// Message returned by every admin route on an untrusted deployment
pub const ADMIN_FORBIDDEN_MESSAGE: &str = "This request is restricted on server side";

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Upstream error: {0}")]
    Source(#[from] SourceError),

    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<WallpaperError> for AppError {
    fn from(err: WallpaperError) -> Self {
        match err {
            WallpaperError::InvalidPage(_) => AppError::BadRequest(err.to_string()),
            WallpaperError::NotFound(message) => AppError::NotFound(message),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "A database error occurred".to_string())
            },
            AppError::NotFound(ref message) => (StatusCode::NOT_FOUND, message.clone()),
            AppError::BadRequest(ref message) => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::Forbidden(ref message) => (StatusCode::FORBIDDEN, message.clone()),
            AppError::Source(ref e) => {
                tracing::warn!("Upstream API error: {}", e);
                let status = match e {
                    SourceError::NotFound(_) => StatusCode::NOT_FOUND,
                    SourceError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, e.to_string())
            },
            AppError::Ingest(ref e) => {
                let status = match e {
                    IngestError::InvalidCollectionName(_) => StatusCode::BAD_REQUEST,
                    IngestError::Busy => StatusCode::CONFLICT,
                    IngestError::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
                    _ => {
                        tracing::error!("Ingestion error: {}", e);
                        StatusCode::INTERNAL_SERVER_ERROR
                    },
                };
                (status, e.to_string())
            },
            AppError::Internal(ref message) => {
                tracing::error!("Internal error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message.clone())
            },
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}
