use super::RecordStore;
use super::persistence::StoreSnapshot;
use crate::core::{FailedRecord, LogRecord, Partition, RecordId, StoreError, StoreResult};
use crate::scope::ScopePredicate;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Partitions {
    failed: BTreeMap<RecordId, FailedRecord>,
    primary: BTreeMap<RecordId, LogRecord>,
}

impl Partitions {
    fn contains(&self, id: RecordId) -> Option<Partition> {
        if self.failed.contains_key(&id) {
            Some(Partition::Failed)
        } else if self.primary.contains_key(&id) {
            Some(Partition::Primary)
        } else {
            None
        }
    }
}

/// In-memory two-partition record store.
///
/// Both partitions sit behind a single lock, so a move is atomic with respect
/// to every other read and move on the same store.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    partitions: RwLock<Partitions>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store whose failed partition holds `records`.
    pub fn with_failed(records: impl IntoIterator<Item = FailedRecord>) -> StoreResult<Self> {
        let mut partitions = Partitions::default();
        for record in records {
            if let Some(partition) = partitions.contains(record.id) {
                return Err(StoreError::DuplicateRecord(record.id, partition));
            }
            partitions.failed.insert(record.id, record);
        }
        Ok(Self {
            partitions: RwLock::new(partitions),
        })
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> StoreResult<Self> {
        let mut store = Self::with_failed(snapshot.failed)?;
        let partitions = store.partitions.get_mut();
        for record in snapshot.primary {
            if let Some(partition) = partitions.contains(record.id) {
                return Err(StoreError::DuplicateRecord(record.id, partition));
            }
            partitions.primary.insert(record.id, record);
        }
        Ok(store)
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let partitions = self.partitions.read().await;
        StoreSnapshot::new(
            partitions.failed.values().cloned().collect(),
            partitions.primary.values().cloned().collect(),
        )
    }

    /// Quarantine a record, as the delivery pipeline does when a send fails.
    pub async fn insert_failed(&self, record: FailedRecord) -> StoreResult<()> {
        let mut partitions = self.partitions.write().await;
        if let Some(partition) = partitions.contains(record.id) {
            return Err(StoreError::DuplicateRecord(record.id, partition));
        }
        partitions.failed.insert(record.id, record);
        Ok(())
    }

    pub async fn failed_records(&self) -> Vec<FailedRecord> {
        self.partitions.read().await.failed.values().cloned().collect()
    }

    pub async fn primary_records(&self) -> Vec<LogRecord> {
        self.partitions.read().await.primary.values().cloned().collect()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn fetch_page(
        &self,
        predicate: &ScopePredicate,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<RecordId>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .failed
            .values()
            .filter(|record| predicate.matches(record))
            .skip(offset)
            .take(limit)
            .map(|record| record.id)
            .collect())
    }

    async fn move_batch(&self, ids: &[RecordId], destination: Partition) -> StoreResult<()> {
        if destination != Partition::Primary {
            return Err(StoreError::MoveRejected(format!(
                "cannot move failed records into the {} partition",
                destination
            )));
        }

        let mut partitions = self.partitions.write().await;

        // Validate the whole batch before touching anything.
        for (index, id) in ids.iter().enumerate() {
            if !partitions.failed.contains_key(id) {
                return Err(StoreError::RecordNotFound(*id, Partition::Failed));
            }
            if partitions.primary.contains_key(id) {
                return Err(StoreError::DuplicateRecord(*id, Partition::Primary));
            }
            if ids[..index].contains(id) {
                return Err(StoreError::MoveRejected(format!(
                    "record {} appears twice in one batch",
                    id
                )));
            }
        }

        for id in ids {
            if let Some(record) = partitions.failed.remove(id) {
                partitions.primary.insert(*id, record.into_log_record());
            }
        }
        Ok(())
    }

    async fn count(&self, partition: Partition) -> StoreResult<usize> {
        let partitions = self.partitions.read().await;
        Ok(match partition {
            Partition::Failed => partitions.failed.len(),
            Partition::Primary => partitions.primary.len(),
        })
    }
}
