use crate::core::{RecordId, StoreResult};
use crate::scope::ScopePredicate;
use crate::storage::RecordStore;
use std::sync::Arc;

/// Bounded, identifier-ordered reads over the filtered failed set.
///
/// The cursor is an offset into the *current* filtered set. It only moves
/// when the caller says so: records that left the set shift everything after
/// them down, so a page that was moved must not be skipped over.
pub struct Paginator {
    store: Arc<dyn RecordStore>,
    predicate: ScopePredicate,
    batch_size: usize,
    cursor: usize,
}

impl Paginator {
    pub fn new(store: Arc<dyn RecordStore>, predicate: ScopePredicate, batch_size: usize) -> Self {
        Self {
            store,
            predicate,
            batch_size,
            cursor: 0,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Read the page at the current cursor. An empty page means exhausted.
    pub async fn fetch(&self) -> StoreResult<Vec<RecordId>> {
        self.store
            .fetch_page(&self.predicate, self.cursor, self.batch_size)
            .await
    }

    /// Step past `count` records that stay in the filtered set.
    pub fn advance(&mut self, count: usize) {
        self.cursor += count;
    }
}
