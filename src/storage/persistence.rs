//! JSON snapshots of the in-memory record store

use crate::core::{FailedRecord, LogRecord, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub failed: Vec<FailedRecord>,
    #[serde(default)]
    pub primary: Vec<LogRecord>,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl StoreSnapshot {
    pub fn new(failed: Vec<FailedRecord>, primary: Vec<LogRecord>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            created_at: Utc::now(),
            failed,
            primary,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }

    /// Write the snapshot atomically: a temp file in the target directory is
    /// synced and then renamed over the previous snapshot.
    pub fn save(&self, snapshot: &StoreSnapshot) -> StoreResult<()> {
        let parent = match self.snapshot_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| {
            StoreError::Snapshot(format!("Failed to create snapshot directory: {}", e))
        })?;

        let temp_file = NamedTempFile::new_in(&parent)
            .map_err(|e| StoreError::Snapshot(format!("Failed to create temp file: {}", e)))?;
        {
            let mut writer = BufWriter::new(temp_file.as_file());
            serde_json::to_writer_pretty(&mut writer, snapshot).map_err(|e| {
                StoreError::Snapshot(format!("Failed to serialize snapshot: {}", e))
            })?;
            writer
                .flush()
                .map_err(|e| StoreError::Snapshot(format!("Failed to flush snapshot: {}", e)))?;
        }
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| StoreError::Snapshot(format!("Failed to sync snapshot: {}", e)))?;
        temp_file
            .persist(&self.snapshot_path)
            .map_err(|e| StoreError::Snapshot(format!("Failed to rename snapshot: {}", e)))?;
        Ok(())
    }

    pub fn load(&self) -> StoreResult<Option<StoreSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.snapshot_path)
            .map_err(|e| StoreError::Snapshot(format!("Failed to read snapshot: {}", e)))?;
        let snapshot: StoreSnapshot = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Snapshot(format!("Failed to deserialize snapshot: {}", e)))?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(StoreError::Snapshot(format!(
                "Snapshot version {} is newer than supported version {}",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        Ok(Some(snapshot))
    }
}
