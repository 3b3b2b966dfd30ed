use crate::core::Result;
use crate::engine::{DEFAULT_BATCH_SIZE, RunConfig, RunController, RunReport, RunStatus};
use crate::scope::ScopeFilter;
use crate::storage::RecordStore;
use std::sync::Arc;
use std::time::Duration;

/// Process exit status of an on-demand run.
pub const EXIT_COMPLETED: u8 = 0;
pub const EXIT_STORE_FAILURE: u8 = 1;
pub const EXIT_INVALID_SCOPE: u8 = 2;
pub const EXIT_DEADLINE: u8 = 3;

/// Parameters of an operator-invoked resend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendRequest {
    /// Comma separated error codes
    pub error_type: Option<String>,
    /// Comma separated event names
    pub event_name: Option<String>,
    pub date_from: Option<i64>,
    pub date_to: Option<i64>,
    pub batch: usize,
    pub dry_run: bool,
    /// Runtime budget in seconds; unbounded when absent
    pub max_runtime: Option<u64>,
}

impl Default for ResendRequest {
    fn default() -> Self {
        Self {
            error_type: None,
            event_name: None,
            date_from: None,
            date_to: None,
            batch: DEFAULT_BATCH_SIZE,
            dry_run: true,
            max_runtime: None,
        }
    }
}

impl ResendRequest {
    /// Parse into a run configuration. Malformed parameters fail here, before
    /// any controller exists.
    pub fn to_run_config(&self) -> Result<RunConfig> {
        let scope = ScopeFilter::parse(
            self.error_type.as_deref(),
            self.event_name.as_deref(),
            self.date_from,
            self.date_to,
        )?;
        let mut config = RunConfig::new(scope)
            .batch_size(self.batch)
            .dry_run(self.dry_run);
        if let Some(secs) = self.max_runtime {
            config = config.max_runtime(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }
}

/// Run a resend to completion against `store`.
pub async fn resend(store: Arc<dyn RecordStore>, request: &ResendRequest) -> Result<RunReport> {
    let config = request.to_run_config()?;
    let controller = RunController::new(store, config)?;
    Ok(controller.run().await)
}

/// Map a run status onto the process exit status.
pub fn exit_code(status: RunStatus) -> u8 {
    match status {
        RunStatus::Exhausted => EXIT_COMPLETED,
        RunStatus::InvalidScope => EXIT_INVALID_SCOPE,
        RunStatus::DeadlineExceeded => EXIT_DEADLINE,
        RunStatus::StoreUnavailable => EXIT_STORE_FAILURE,
    }
}
