use crate::core::{Partition, RecordId};
use crate::storage::RecordStore;
use std::sync::Arc;
use tracing::warn;

/// Result of moving one batch. The batch is the unit of atomicity: there is
/// no partial success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Failed { reason: String },
}

impl MoveOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved)
    }
}

/// Relocates batches of failed records into a destination partition.
pub struct Mover {
    store: Arc<dyn RecordStore>,
    destination: Partition,
}

impl Mover {
    pub fn new(store: Arc<dyn RecordStore>, destination: Partition) -> Self {
        Self { store, destination }
    }

    pub fn destination(&self) -> Partition {
        self.destination
    }

    /// Move `ids` as one unit. Store errors, timeouts included, are absorbed
    /// into [`MoveOutcome::Failed`].
    pub async fn execute(&self, ids: &[RecordId]) -> MoveOutcome {
        if ids.is_empty() {
            return MoveOutcome::Failed {
                reason: "empty batch".to_string(),
            };
        }

        match self.store.move_batch(ids, self.destination).await {
            Ok(()) => MoveOutcome::Moved,
            Err(err) => {
                warn!(
                    error = %err,
                    first_id = ids[0],
                    batch = ids.len(),
                    "batch move failed"
                );
                MoveOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}
