use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source for deadline checks.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset_ms: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.offset_ms.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

/// Runtime Governor: wall-clock budget for one run.
///
/// Checked between batches only. A check never interrupts a batch already in
/// flight.
#[derive(Debug)]
pub struct RuntimeGovernor {
    clock: Arc<dyn Clock>,
    started: Instant,
    limit: Option<Duration>,
}

impl RuntimeGovernor {
    /// Start the budget now.
    pub fn start(clock: Arc<dyn Clock>, limit: Option<Duration>) -> Self {
        let started = clock.now();
        Self {
            clock,
            started,
            limit,
        }
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.started)
    }

    /// True once elapsed time has reached the limit. Never true without a limit.
    pub fn is_expired(&self) -> bool {
        match self.limit {
            Some(limit) => self.elapsed() >= limit,
            None => false,
        }
    }
}
