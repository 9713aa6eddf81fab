//! Error types shared across the wallpaper crates

use thiserror::Error;

/// Result type alias for shared operations
pub type Result<T> = std::result::Result<T, WallpaperError>;

/// Errors that are not specific to one subsystem
#[derive(Error, Debug)]
pub enum WallpaperError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid page number: {0} (pages start at 1)")]
    InvalidPage(i64),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl WallpaperError {
    /// Validate a 1-based page number coming from a public request
    pub fn check_page(page: i64) -> Result<i64> {
        if page < 1 {
            return Err(WallpaperError::InvalidPage(page));
        }
        Ok(page)
    }
}
