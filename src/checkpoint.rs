//! Replay checkpoints.
//!
//! A checkpoint records how many capture frames have been fully emitted,
//! so an interrupted replay resumes right after the last flushed commit.
//!
//! # Example
//!
//! ```rust,no_run
//! use pg_decoding_json::checkpoint::{Checkpoint, CheckpointManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = CheckpointManager::new("replay-checkpoint.json");
//!
//!     if let Some(checkpoint) = manager.load().await? {
//!         println!("Resuming after frame {}", checkpoint.frame);
//!     }
//!
//!     let checkpoint = Checkpoint::new(42, Some(731), "0/16B3748".to_string(), 120);
//!     manager.save(&checkpoint).await?;
//!
//!     Ok(())
//! }
//! ```

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

/// Position in a capture up to which output has been flushed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    /// Number of capture frames fully processed
    pub frame: u64,
    /// Transaction committed by the last processed frame
    pub xid: Option<u32>,
    /// Commit LSN of that transaction, in `X/X` form
    pub lsn: String,
    /// When this checkpoint was taken
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// JSON objects written since the start of the capture
    pub message_count: u64,
}

impl Checkpoint {
    /// Creates a checkpoint stamped with the current time.
    pub fn new(frame: u64, xid: Option<u32>, lsn: String, message_count: u64) -> Self {
        Self {
            frame,
            xid,
            lsn,
            timestamp: chrono::Utc::now(),
            message_count,
        }
    }
}

/// Persists checkpoints to a JSON file.
///
/// Writes go through a temporary file that is synced and then renamed over
/// the target, so a crash never leaves a partially written checkpoint.
pub struct CheckpointManager {
    file_path: PathBuf,
}

impl CheckpointManager {
    pub fn new(checkpoint_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: checkpoint_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Loads the checkpoint, or `None` when no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the file exists but cannot be read or does not
    /// contain a valid checkpoint.
    pub async fn load(&self) -> Result<Option<Checkpoint>> {
        if !fs::try_exists(&self.file_path).await? {
            debug!("No checkpoint file found at {:?}", self.file_path);
            return Ok(None);
        }

        let content = fs::read_to_string(&self.file_path).await.map_err(|e| {
            error!("Failed to read checkpoint file: {}", e);
            e
        })?;

        match serde_json::from_str::<Checkpoint>(&content) {
            Ok(checkpoint) => {
                info!(
                    "Loaded checkpoint: frame={}, LSN={}, timestamp={}",
                    checkpoint.frame, checkpoint.lsn, checkpoint.timestamp
                );
                Ok(Some(checkpoint))
            }
            Err(e) => {
                error!("Failed to parse checkpoint file: {}", e);
                Err(e.into())
            }
        }
    }

    /// Saves the checkpoint atomically.
    pub async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        debug!("Saving checkpoint: frame={}, LSN={}", checkpoint.frame, checkpoint.lsn);

        let temp_path = self.file_path.with_extension("tmp");

        let json = serde_json::to_string_pretty(checkpoint)?;
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;

        fs::rename(&temp_path, &self.file_path).await?;

        debug!("Checkpoint saved successfully");
        Ok(())
    }

    /// Removes the checkpoint so the next replay starts from the first frame.
    pub async fn delete(&self) -> Result<()> {
        if fs::try_exists(&self.file_path).await? {
            fs::remove_file(&self.file_path).await?;
            info!("Deleted checkpoint file");
        }
        Ok(())
    }
}
