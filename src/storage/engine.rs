use crate::core::{Partition, RecordId, StoreResult};
use crate::scope::ScopePredicate;
use async_trait::async_trait;

/// Record store trait - the engine's only view of storage
///
/// Implementations must make `move_batch` atomic per call and safe to invoke
/// from independent runs at the same time.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read up to `limit` ids of failed records matching `predicate`, ordered
    /// by id ascending, skipping the first `offset` matches.
    async fn fetch_page(
        &self,
        predicate: &ScopePredicate,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<RecordId>>;

    /// Move every record in `ids` out of the failed partition into
    /// `destination`, all or nothing.
    async fn move_batch(&self, ids: &[RecordId], destination: Partition) -> StoreResult<()>;

    /// Number of records currently held in `partition`.
    async fn count(&self, partition: Partition) -> StoreResult<usize>;
}
