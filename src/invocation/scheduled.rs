use super::settings::ResendSettings;
use crate::core::{RequeueError, Result};
use crate::engine::{Clock, RunConfig, RunController, RunReport, RunStatus, SystemClock};
use crate::scope::ScopeFilter;
use crate::storage::RecordStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, info_span, Instrument};

/// A queued scheduled resend: the settings captured at trigger time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResendJob {
    pub errortype: String,
    pub eventname: String,
    pub datefrom: i64,
    pub dateto: i64,
    pub runtime: u64,
    pub batch: usize,
}

impl ResendJob {
    pub fn from_settings(settings: &ResendSettings) -> Self {
        Self {
            errortype: settings.error_type.clone(),
            eventname: settings.event_name.clone(),
            datefrom: settings.date_from,
            dateto: settings.date_to,
            runtime: settings.runtime,
            batch: settings.batch,
        }
    }

    /// JSON form, as logged when the job is queued.
    pub fn custom_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }

    /// Scheduled runs never dry-run. Zero dates are treated as unset and a
    /// zero runtime as no budget.
    pub fn to_run_config(&self) -> Result<RunConfig> {
        let scope = ScopeFilter::parse(
            Some(self.errortype.as_str()),
            Some(self.eventname.as_str()),
            non_zero(self.datefrom),
            non_zero(self.dateto),
        )?;
        let mut config = RunConfig::new(scope).batch_size(self.batch).dry_run(false);
        if self.runtime > 0 {
            config = config.max_runtime(Duration::from_secs(self.runtime));
        }
        config.validate()?;
        Ok(config)
    }
}

fn non_zero(value: i64) -> Option<i64> {
    (value != 0).then_some(value)
}

/// Successful scheduled-task completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Every record in scope was attempted.
    Completed,
    /// The runtime budget ran out; the next trigger picks up the rest.
    Deferred,
}

/// Scheduled-task failures, in the scheduler's retry convention.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Resend settings are invalid: {0}")]
    InvalidSettings(#[source] RequeueError),

    #[error("Resend scope is invalid: {0}")]
    InvalidScope(String),

    #[error("Record store unavailable: {0}")]
    Store(String),
}

impl TaskError {
    /// Whether running the same job again could succeed without operator action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Translate a finished run into the scheduler's success/failure signal.
pub fn task_outcome(report: &RunReport) -> std::result::Result<TaskOutcome, TaskError> {
    let cause = || report.error.clone().unwrap_or_default();
    match report.status {
        RunStatus::Exhausted => Ok(TaskOutcome::Completed),
        RunStatus::DeadlineExceeded => Ok(TaskOutcome::Deferred),
        RunStatus::InvalidScope => Err(TaskError::InvalidScope(cause())),
        RunStatus::StoreUnavailable => Err(TaskError::Store(cause())),
    }
}

/// The scheduled front end of the requeue engine.
pub struct ResendTask {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl ResendTask {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Capture the current settings as a job.
    pub fn queue(&self, settings: &ResendSettings) -> ResendJob {
        let job = ResendJob::from_settings(settings);
        info!(
            "Queued a new resend job with configuration ... {}",
            job.custom_data()
        );
        job
    }

    /// Run a queued job through the engine.
    pub async fn execute(&self, job: &ResendJob) -> std::result::Result<RunReport, TaskError> {
        let config = job.to_run_config().map_err(TaskError::InvalidSettings)?;
        let controller = RunController::new(self.store.clone(), config)
            .map_err(TaskError::InvalidSettings)?
            .with_clock(self.clock.clone());
        Ok(controller.run().await)
    }

    /// One scheduler tick: queue from settings, execute, and signal.
    pub async fn trigger(&self, settings: &ResendSettings) -> std::result::Result<TaskOutcome, TaskError> {
        let span = info_span!("requeue.task");
        async {
            let job = self.queue(settings);
            let report = self.execute(&job).await?;
            let outcome = task_outcome(&report);
            match &outcome {
                Ok(TaskOutcome::Completed) => info!("resend task completed"),
                Ok(TaskOutcome::Deferred) => info!("resend task deferred, records remain in scope"),
                Err(err) => error!(error = %err, retryable = err.is_retryable(), "resend task failed"),
            }
            outcome
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RunCounters;
    use uuid::Uuid;

    fn report(status: RunStatus, error: Option<&str>) -> RunReport {
        RunReport {
            run_id: Uuid::nil(),
            status,
            counters: RunCounters::default(),
            cursor: 0,
            batches: Vec::new(),
            elapsed: Duration::ZERO,
            dry_run: false,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_job_from_settings_and_custom_data() {
        let settings = ResendSettings {
            runtime: 60,
            error_type: "401".to_string(),
            event_name: String::new(),
            date_from: 100,
            date_to: 0,
            batch: 10,
        };

        let job = ResendJob::from_settings(&settings);
        assert_eq!(
            job.custom_data(),
            r#"{"errortype":"401","eventname":"","datefrom":100,"dateto":0,"runtime":60,"batch":10}"#
        );
        let parsed: ResendJob = serde_json::from_str(&job.custom_data()).unwrap();
        assert_eq!(parsed, job);
    }

    #[test]
    fn test_job_run_config_semantics() {
        let job = ResendJob {
            errortype: "401,403".to_string(),
            eventname: "a\nb".to_string(),
            datefrom: 0,
            dateto: 500,
            runtime: 0,
            batch: 25,
        };

        let config = job.to_run_config().unwrap();
        assert!(!config.dry_run);
        assert_eq!(config.max_runtime, None);
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.scope.error_types, vec![401, 403]);
        assert_eq!(config.scope.event_names, vec!["a", "b"]);
        assert_eq!(config.scope.date_from, None);
        assert_eq!(config.scope.date_to, Some(500));
    }

    #[test]
    fn test_task_outcome_mapping() {
        assert_eq!(
            task_outcome(&report(RunStatus::Exhausted, None)).unwrap(),
            TaskOutcome::Completed
        );
        assert_eq!(
            task_outcome(&report(RunStatus::DeadlineExceeded, None)).unwrap(),
            TaskOutcome::Deferred
        );

        let invalid = task_outcome(&report(RunStatus::InvalidScope, Some("from > to"))).unwrap_err();
        assert!(matches!(invalid, TaskError::InvalidScope(ref cause) if cause == "from > to"));
        assert!(!invalid.is_retryable());

        let store = task_outcome(&report(RunStatus::StoreUnavailable, Some("down"))).unwrap_err();
        assert!(store.is_retryable());
    }
}
