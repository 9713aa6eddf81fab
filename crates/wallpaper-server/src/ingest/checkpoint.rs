//! Checkpoint persistence
//!
//! The engine talks to [`CheckpointStore`] only, so the medium can change
//! without touching the run loop. [`FileCheckpointStore`] keeps the cursor in
//! `<dir>/stack.json` and the run report in `<dir>/report.txt`.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::cursor::ProgressCursor;

const CHECKPOINT_FILE: &str = "stack.json";
const CHECKPOINT_TMP_FILE: &str = "stack.json.tmp";
const REPORT_FILE: &str = "report.txt";

#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint {path} is not valid: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode checkpoint: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable storage of the progress cursor and the run report
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Last persisted cursor, or a freshly persisted zeroed one on first run
    async fn load(&self) -> Result<ProgressCursor, CheckpointError>;

    /// Replace the persisted cursor
    async fn save(&self, cursor: &ProgressCursor) -> Result<(), CheckpointError>;

    /// Append a timestamped note to the run report
    async fn append_report(&self, text: &str) -> Result<(), CheckpointError>;
}

/// Checkpoint store backed by files in one directory
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
    report_offset: FixedOffset,
}

impl FileCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>, report_offset: FixedOffset) -> Self {
        Self {
            dir: dir.into(),
            report_offset,
        }
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.dir.join(CHECKPOINT_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.dir.join(REPORT_FILE)
    }

    async fn ensure_dir(&self) -> Result<(), CheckpointError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| CheckpointError::Write {
                path: self.dir.clone(),
                source,
            })
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self) -> Result<ProgressCursor, CheckpointError> {
        let path = self.checkpoint_path();

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let cursor = serde_json::from_slice(&bytes)
                    .map_err(|source| CheckpointError::Corrupt { path, source })?;
                debug!(?cursor, "Loaded checkpoint");
                Ok(cursor)
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No checkpoint found, starting from a zeroed cursor");
                self.ensure_dir().await?;
                let cursor = ProgressCursor::default();
                self.save(&cursor).await?;
                Ok(cursor)
            },
            Err(source) => Err(CheckpointError::Read { path, source }),
        }
    }

    async fn save(&self, cursor: &ProgressCursor) -> Result<(), CheckpointError> {
        let json = serde_json::to_vec_pretty(cursor)?;
        let tmp = self.dir.join(CHECKPOINT_TMP_FILE);
        let path = self.checkpoint_path();

        write_file(&tmp, &json).await?;
        // rename is atomic on the same filesystem: readers see the old or the new record
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| CheckpointError::Write { path, source })
    }

    async fn append_report(&self, text: &str) -> Result<(), CheckpointError> {
        self.ensure_dir().await?;
        let path = self.report_path();
        let entry = format_report_entry(text, Utc::now().with_timezone(&self.report_offset));

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|source| CheckpointError::Write {
                path: path.clone(),
                source,
            })?;

        file.write_all(entry.as_bytes())
            .await
            .map_err(|source| CheckpointError::Write { path, source })
    }
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), CheckpointError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|source| CheckpointError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    file.write_all(contents).await.map_err(|source| CheckpointError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    file.sync_all().await.map_err(|source| CheckpointError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Render one report entry: the note, then a separator carrying date and time
pub fn format_report_entry(text: &str, at: DateTime<FixedOffset>) -> String {
    format!(
        "{} \n ----------------- {} | {}----------------- \n\n\n\n",
        text,
        at.format("%d/%m/%Y"),
        at.format("%-I:%M:%S %P"),
    )
}
