// ============================================================================
// logrequeue Library
// ============================================================================

pub mod core;
pub mod scope;
pub mod storage;
pub mod engine;
pub mod invocation;

// Re-export main types for convenience
pub use core::{FailedRecord, LogRecord, Partition, RecordId, RequeueError, Result, StoreError};
pub use scope::{ScopeFilter, ScopePredicate, build_predicate};
pub use storage::{InMemoryRecordStore, RecordStore, SnapshotManager, StoreSnapshot};
pub use engine::{RunConfig, RunController, RunCounters, RunReport, RunStatus};

// Re-export front ends
pub use invocation::{
    ResendRequest, ResendSettings, ResendTask, TaskError, TaskOutcome,
    on_demand::exit_code,
};

/// Move every failed record matching `scope` back into the primary partition.
///
/// Shorthand for building a [`RunController`] with default limits and running
/// it once.
///
/// # Examples
///
/// ```
/// use logrequeue::{FailedRecord, InMemoryRecordStore, Partition, RecordStore, RunStatus, ScopeFilter};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let store = Arc::new(InMemoryRecordStore::with_failed(vec![
///     FailedRecord::new(1, 401, "\\core\\event\\course_viewed", 1_698_982_800),
///     FailedRecord::new(2, 500, "\\core\\event\\course_viewed", 1_698_982_801),
/// ]).unwrap());
///
/// let report = logrequeue::requeue(store.clone(), ScopeFilter::all().error_types([401]))
///     .await
///     .unwrap();
///
/// assert_eq!(report.status, RunStatus::Exhausted);
/// assert_eq!(report.counters.total_succeeded, 1);
/// assert_eq!(store.count(Partition::Failed).await.unwrap(), 1);
/// # });
/// ```
pub async fn requeue(
    store: std::sync::Arc<dyn RecordStore>,
    scope: ScopeFilter,
) -> Result<RunReport> {
    let controller = RunController::new(store, RunConfig::new(scope))?;
    Ok(controller.run().await)
}
