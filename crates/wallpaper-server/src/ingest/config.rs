//! Ingestion configuration
//!
//! Loaded from `INGEST_*` and `UNSPLASH_*` environment variables.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Unsplash caps `per_page` at 30
pub const MAX_PER_PAGE: u32 = 30;

/// Main ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory holding `stack.json` and `report.txt`
    pub checkpoint_dir: PathBuf,
    /// External API calls allowed per run before the loop suspends
    pub api_call_limit: u64,
    /// Consecutive failures tolerated on one page before the run stops
    pub max_page_retries: u32,
    /// Pause between two attempts at the same page
    pub retry_delay_ms: u64,
    /// Offset used to timestamp run report entries (default IST, +05:30)
    pub report_utc_offset_minutes: i32,
    /// Start the run loop as soon as the server is up
    pub autostart: bool,
    pub unsplash: UnsplashConfig,
}

/// Unsplash API client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsplashConfig {
    pub access_key: String,
    pub base_url: String,
    pub per_page: u32,
    pub timeout_secs: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl IngestConfig {
    /// Load ingestion configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let config = Self {
            checkpoint_dir: std::env::var("INGEST_CHECKPOINT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.checkpoint_dir),
            api_call_limit: env_or("INGEST_API_CALL_LIMIT", defaults.api_call_limit),
            max_page_retries: env_or("INGEST_MAX_PAGE_RETRIES", defaults.max_page_retries),
            retry_delay_ms: env_or("INGEST_RETRY_DELAY_MS", defaults.retry_delay_ms),
            report_utc_offset_minutes: env_or(
                "INGEST_REPORT_UTC_OFFSET_MINUTES",
                defaults.report_utc_offset_minutes,
            ),
            autostart: env_or("INGEST_AUTOSTART", defaults.autostart),
            unsplash: UnsplashConfig::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.checkpoint_dir.as_os_str().is_empty() {
            anyhow::bail!("INGEST_CHECKPOINT_DIR cannot be empty");
        }
        if self.api_call_limit == 0 {
            anyhow::bail!("INGEST_API_CALL_LIMIT must be greater than 0");
        }
        if self.report_offset().is_none() {
            anyhow::bail!(
                "INGEST_REPORT_UTC_OFFSET_MINUTES out of range: {}",
                self.report_utc_offset_minutes
            );
        }
        self.unsplash.validate()
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn report_offset(&self) -> Option<FixedOffset> {
        self.report_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
    }
}

impl UnsplashConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            access_key: std::env::var("UNSPLASH_ACCESS_KEY").unwrap_or_default(),
            base_url: std::env::var("UNSPLASH_BASE_URL").unwrap_or(defaults.base_url),
            per_page: env_or("UNSPLASH_PER_PAGE", defaults.per_page),
            timeout_secs: env_or("UNSPLASH_TIMEOUT_SECS", defaults.timeout_secs),
        })
    }

    /// The access key is not checked here; [`UnsplashClient::new`] rejects a
    /// missing one.
    ///
    /// [`UnsplashClient::new`]: super::UnsplashClient::new
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.is_empty() {
            anyhow::bail!("UNSPLASH_BASE_URL cannot be empty");
        }
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            anyhow::bail!(
                "UNSPLASH_PER_PAGE must be between 1 and {}, got {}",
                MAX_PER_PAGE,
                self.per_page
            );
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("UNSPLASH_TIMEOUT_SECS must be greater than 0");
        }
        Ok(())
    }

    pub fn has_access_key(&self) -> bool {
        !self.access_key.trim().is_empty()
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from("./temp"),
            api_call_limit: 50,
            max_page_retries: 3,
            retry_delay_ms: 5000,
            report_utc_offset_minutes: 330,
            autostart: false,
            unsplash: UnsplashConfig::default(),
        }
    }
}

impl Default for UnsplashConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            base_url: "https://api.unsplash.com".to_string(),
            per_page: MAX_PER_PAGE,
            timeout_secs: 30,
        }
    }
}
