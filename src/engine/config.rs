use crate::core::{RequeueError, Result};
use crate::scope::ScopeFilter;
use std::time::Duration;

/// Batch size used when the operator does not supply one.
pub const DEFAULT_BATCH_SIZE: usize = 12_500;

/// Run configuration
///
/// Immutable for the duration of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Which failed records the run considers
    pub scope: ScopeFilter,

    /// Maximum number of ids read and moved per iteration
    pub batch_size: usize,

    /// Wall-clock budget; `None` never expires, `Some(ZERO)` is already expired
    pub max_runtime: Option<Duration>,

    /// Count matches without moving anything
    pub dry_run: bool,
}

impl RunConfig {
    pub fn new(scope: ScopeFilter) -> Self {
        Self {
            scope,
            batch_size: DEFAULT_BATCH_SIZE,
            max_runtime: None,
            dry_run: false,
        }
    }

    /// Set the batch size
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the runtime budget
    pub fn max_runtime(mut self, max_runtime: Duration) -> Self {
        self.max_runtime = Some(max_runtime);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate limits. Scope validation happens when the run starts.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(RequeueError::InvalidConfig(
                "batch size must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(ScopeFilter::all())
    }
}
