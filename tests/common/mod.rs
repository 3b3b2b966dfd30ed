#![allow(dead_code)]

use async_trait::async_trait;
use logrequeue::core::{FailedRecord, Partition, RecordId, StoreError, StoreResult};
use logrequeue::engine::ManualClock;
use logrequeue::scope::ScopePredicate;
use logrequeue::storage::RecordStore;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the stub answers move requests.
#[derive(Debug, Clone)]
pub enum MovePolicy {
    AlwaysSucceed,
    AlwaysFail,
    /// Batches containing any of these ids are rejected.
    FailIds(HashSet<RecordId>),
}

/// Scripted record store that counts every call it receives.
#[derive(Debug)]
pub struct StubStore {
    failed: Mutex<Vec<FailedRecord>>,
    moved: Mutex<Vec<RecordId>>,
    policy: MovePolicy,
    unavailable: bool,
    pub fetch_calls: AtomicUsize,
    pub move_calls: AtomicUsize,
    pub fetch_offsets: Mutex<Vec<usize>>,
    /// Advanced by `tick` after each move call.
    clock: Option<(Arc<ManualClock>, Duration)>,
}

impl StubStore {
    pub fn new(records: u64, policy: MovePolicy) -> Self {
        Self::with_records(
            (1..=records).map(|id| FailedRecord::new(id, 401, "\\core\\event\\course_viewed", 1_000 + id as i64)),
            policy,
        )
    }

    pub fn with_records(records: impl IntoIterator<Item = FailedRecord>, policy: MovePolicy) -> Self {
        let mut records: Vec<_> = records.into_iter().collect();
        records.sort_by_key(|record| record.id);
        Self {
            failed: Mutex::new(records),
            moved: Mutex::new(Vec::new()),
            policy,
            unavailable: false,
            fetch_calls: AtomicUsize::new(0),
            move_calls: AtomicUsize::new(0),
            fetch_offsets: Mutex::new(Vec::new()),
            clock: None,
        }
    }

    /// Every page read fails.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn with_clock(mut self, clock: Arc<ManualClock>, tick: Duration) -> Self {
        self.clock = Some((clock, tick));
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn moves(&self) -> usize {
        self.move_calls.load(Ordering::SeqCst)
    }

    pub fn offsets(&self) -> Vec<usize> {
        self.fetch_offsets.lock().unwrap().clone()
    }

    pub fn moved_ids(&self) -> Vec<RecordId> {
        self.moved.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.failed.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for StubStore {
    async fn fetch_page(
        &self,
        predicate: &ScopePredicate,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<RecordId>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetch_offsets.lock().unwrap().push(offset);
        if self.unavailable {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(self
            .failed
            .lock()
            .unwrap()
            .iter()
            .filter(|record| predicate.matches(record))
            .skip(offset)
            .take(limit)
            .map(|record| record.id)
            .collect())
    }

    async fn move_batch(&self, ids: &[RecordId], _destination: Partition) -> StoreResult<()> {
        self.move_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((clock, tick)) = &self.clock {
            clock.advance(*tick);
        }

        let rejected = match &self.policy {
            MovePolicy::AlwaysSucceed => false,
            MovePolicy::AlwaysFail => true,
            MovePolicy::FailIds(bad) => ids.iter().any(|id| bad.contains(id)),
        };
        if rejected {
            return Err(StoreError::MoveRejected("destination refused the batch".to_string()));
        }

        let batch: HashSet<_> = ids.iter().copied().collect();
        self.failed.lock().unwrap().retain(|record| !batch.contains(&record.id));
        self.moved.lock().unwrap().extend_from_slice(ids);
        Ok(())
    }

    async fn count(&self, partition: Partition) -> StoreResult<usize> {
        Ok(match partition {
            Partition::Failed => self.failed.lock().unwrap().len(),
            Partition::Primary => self.moved.lock().unwrap().len(),
        })
    }
}
