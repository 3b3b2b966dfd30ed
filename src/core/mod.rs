pub mod error;
pub mod types;
pub mod value;

pub use error::{RequeueError, Result, StoreError, StoreResult};
pub use types::{FailedRecord, LogRecord, Partition, RecordId};
pub use value::Value;
