use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a log record. Preserved when a record changes partition.
pub type RecordId = u64;

/// Logical partitions of the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    /// Quarantine area for records whose delivery failed.
    Failed,
    /// Records waiting for (or done with) normal delivery.
    Primary,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed => write!(f, "failed"),
            Self::Primary => write!(f, "primary"),
        }
    }
}

/// A record living in the failed partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedRecord {
    pub id: RecordId,
    /// Delivery error code captured when the record was quarantined (e.g. 401, 403).
    pub error_type: i64,
    pub event_name: String,
    /// Creation time, epoch seconds.
    pub time_created: i64,
    /// Opaque event fields, carried through unchanged on move.
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Response body returned by the endpoint at failure time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl FailedRecord {
    pub fn new(id: RecordId, error_type: i64, event_name: impl Into<String>, time_created: i64) -> Self {
        Self {
            id,
            error_type,
            event_name: event_name.into(),
            time_created,
            payload: serde_json::Value::Null,
            response: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Strip the failure-only attributes for re-entry into the primary partition.
    pub fn into_log_record(self) -> LogRecord {
        LogRecord {
            id: self.id,
            event_name: self.event_name,
            time_created: self.time_created,
            payload: self.payload,
        }
    }
}

/// A record in the primary partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: RecordId,
    pub event_name: String,
    pub time_created: i64,
    #[serde(default)]
    pub payload: serde_json::Value,
}
