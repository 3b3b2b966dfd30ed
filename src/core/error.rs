use crate::core::types::{Partition, RecordId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RequeueError {
    #[error("Invalid scope: date from ({from}) must not be after date to ({to})")]
    InvalidScope { from: i64, to: i64 },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl RequeueError {
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised at the record store seam.
///
/// The engine never inspects these beyond logging them: a failed move is a
/// batch failure and a failed read ends the scan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record {0} not found in the {1} partition")]
    RecordNotFound(RecordId, Partition),

    #[error("Record {0} already exists in the {1} partition")]
    DuplicateRecord(RecordId, Partition),

    #[error("Move rejected: {0}")]
    MoveRejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

pub type Result<T> = std::result::Result<T, RequeueError>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<std::io::Error> for RequeueError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}
