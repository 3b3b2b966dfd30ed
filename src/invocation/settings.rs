use crate::core::{RequeueError, Result};
use crate::engine::DEFAULT_BATCH_SIZE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Persisted settings for the scheduled resend task.
///
/// Keys match the names the settings screen stores. Empty strings and zero
/// dates mean "not applied"; a zero runtime means no budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResendSettings {
    #[serde(rename = "resendtaskruntime")]
    pub runtime: u64,

    #[serde(rename = "resendtaskerrortype")]
    pub error_type: String,

    #[serde(rename = "resendeventname")]
    pub event_name: String,

    #[serde(rename = "resenddatefrom")]
    pub date_from: i64,

    #[serde(rename = "resenddateto")]
    pub date_to: i64,

    #[serde(rename = "resendbatch")]
    pub batch: usize,
}

impl Default for ResendSettings {
    fn default() -> Self {
        Self {
            runtime: 0,
            error_type: String::new(),
            event_name: String::new(),
            date_from: 0,
            date_to: 0,
            batch: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ResendSettings {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            RequeueError::InvalidConfig(format!(
                "failed to parse settings '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
