//! Wallpaper Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the wallpaper workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`WallpaperError`] and the [`Result`] alias
//! - **Logging**: environment-driven `tracing` setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use wallpaper_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{Result, WallpaperError};
