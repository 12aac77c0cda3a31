//! Session log written when a monitoring session ends.

use crate::acquisition::types::RawSample;
use crate::core::aggregate::BatchAnalysis;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Everything a session produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    pub session_id: Uuid,
    /// Machine the monitor ran on
    pub host: String,
    pub session_start: DateTime<Utc>,
    pub session_end: DateTime<Utc>,
    pub total_batches: usize,
    pub total_samples: usize,
    pub batch_history: Vec<BatchAnalysis>,
    pub raw_samples: Vec<RawSample>,
}

impl SessionLog {
    /// File name under the export directory, stamped with the session end.
    pub fn file_name(&self) -> String {
        format!(
            "eeg_session_{}.json",
            self.session_end.format("%Y%m%d_%H%M%S")
        )
    }

    /// A session that never received a sample has nothing worth keeping.
    pub fn is_empty(&self) -> bool {
        self.total_samples == 0
    }

    /// Write the log as pretty JSON into `dir`.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, PersistError> {
        std::fs::create_dir_all(dir).map_err(|e| PersistError::Io(e.to_string()))?;

        let path = dir.join(self.file_name());
        let json =
            serde_json::to_string_pretty(self).map_err(|e| PersistError::Serialize(e.to_string()))?;
        std::fs::write(&path, json).map_err(|e| PersistError::Io(e.to_string()))?;

        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let content = std::fs::read_to_string(path).map_err(|e| PersistError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| PersistError::Serialize(e.to_string()))
    }
}

/// Name of this machine, or "unknown".
pub fn host_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Session persistence errors.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
}
