use super::args::Command;
use anyhow::{Context, Result};
use logrequeue::core::{FailedRecord, Partition, RequeueError};
use logrequeue::invocation::on_demand::{
    EXIT_COMPLETED, EXIT_DEADLINE, EXIT_INVALID_SCOPE, EXIT_STORE_FAILURE,
};
use logrequeue::invocation::{
    ResendRequest, ResendSettings, ResendTask, TaskError, TaskOutcome, exit_code, resend,
};
use logrequeue::storage::{InMemoryRecordStore, RecordStore, SnapshotManager};
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Owns the store for the lifetime of one process and writes it back after
/// every command that changes it.
pub struct App {
    snapshots: SnapshotManager,
    store: Arc<InMemoryRecordStore>,
}

impl App {
    pub fn open(path: &Path) -> Result<Self> {
        let snapshots = SnapshotManager::new(path);
        let store = match snapshots
            .load()
            .with_context(|| format!("failed to read store '{}'", path.display()))?
        {
            Some(snapshot) => InMemoryRecordStore::from_snapshot(snapshot)
                .with_context(|| format!("store '{}' is inconsistent", path.display()))?,
            None => {
                info!("No store at '{}', starting empty", path.display());
                InMemoryRecordStore::new()
            }
        };
        Ok(Self {
            snapshots,
            store: Arc::new(store),
        })
    }

    pub async fn run(&self, command: Command) -> Result<ExitCode> {
        match command {
            Command::Resend {
                errortype,
                eventname,
                datefrom,
                dateto,
                batch,
                dryrun,
                max_runtime,
            } => {
                let request = ResendRequest {
                    error_type: errortype,
                    event_name: eventname,
                    date_from: datefrom,
                    date_to: dateto,
                    batch,
                    dry_run: dryrun == 1,
                    max_runtime,
                };
                self.resend(&request).await
            }
            Command::RunTask { settings } => self.run_task(&settings).await,
            Command::Schedule { settings, interval } => {
                self.schedule(&settings, Duration::from_secs(interval)).await
            }
            Command::Seed { file } => self.seed(&file).await,
            Command::Status => self.status().await,
        }
    }

    async fn resend(&self, request: &ResendRequest) -> Result<ExitCode> {
        let report = match resend(self.shared_store(), request).await {
            Ok(report) => report,
            Err(err @ (RequeueError::InvalidParameter { .. } | RequeueError::InvalidConfig(_))) => {
                error!(error = %err, "invalid resend parameters");
                return Ok(ExitCode::from(EXIT_INVALID_SCOPE));
            }
            Err(err) => return Err(err.into()),
        };

        if !report.dry_run && report.counters.total_succeeded > 0 {
            self.save().await?;
        }
        if report.status.is_clean() {
            info!(run_id = %report.run_id, "Run finished: {}", report.status);
        } else {
            warn!(run_id = %report.run_id, "Run finished: {}", report.status);
        }
        Ok(ExitCode::from(exit_code(report.status)))
    }

    async fn run_task(&self, settings_path: &Path) -> Result<ExitCode> {
        let settings = ResendSettings::load(settings_path)
            .with_context(|| format!("failed to load settings '{}'", settings_path.display()))?;
        let result = ResendTask::new(self.shared_store()).trigger(&settings).await;
        self.save().await?;
        Ok(ExitCode::from(task_exit_code(&result)))
    }

    async fn schedule(&self, settings_path: &Path, interval: Duration) -> Result<ExitCode> {
        let task = ResendTask::new(self.shared_store());
        info!(
            "Scheduled resend every {}s, press Ctrl-C to stop",
            interval.as_secs()
        );

        loop {
            // Re-read on every tick so edited settings take effect.
            match ResendSettings::load(settings_path) {
                Ok(settings) => {
                    if let Err(err) = task.trigger(&settings).await
                        && !err.is_retryable()
                    {
                        error!("Fix the resend settings; the next tick will read them again");
                    }
                    self.save().await?;
                }
                Err(err) => error!(error = %err, "failed to load resend settings"),
            }

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown requested, stopping scheduled resend");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
        Ok(ExitCode::from(EXIT_COMPLETED))
    }

    async fn seed(&self, file: &Path) -> Result<ExitCode> {
        let raw = fs::read_to_string(file)
            .with_context(|| format!("failed to read '{}'", file.display()))?;
        let records: Vec<FailedRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("'{}' is not a JSON array of failed records", file.display()))?;

        let count = records.len();
        for record in records {
            let id = record.id;
            self.store
                .insert_failed(record)
                .await
                .with_context(|| format!("failed to seed record {}", id))?;
        }
        self.save().await?;
        info!("Seeded {} failed records", count);
        Ok(ExitCode::from(EXIT_COMPLETED))
    }

    async fn status(&self) -> Result<ExitCode> {
        for partition in [Partition::Failed, Partition::Primary] {
            let count = self.store.count(partition).await?;
            println!("{:<8} {}", partition, count);
        }
        Ok(ExitCode::from(EXIT_COMPLETED))
    }

    fn shared_store(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }

    async fn save(&self) -> Result<()> {
        let snapshot = self.store.snapshot().await;
        self.snapshots.save(&snapshot).with_context(|| {
            format!("failed to write store '{}'", self.snapshots.path().display())
        })
    }
}

fn task_exit_code(result: &std::result::Result<TaskOutcome, TaskError>) -> u8 {
    match result {
        Ok(TaskOutcome::Completed) => EXIT_COMPLETED,
        Ok(TaskOutcome::Deferred) => EXIT_DEADLINE,
        Err(TaskError::InvalidSettings(_) | TaskError::InvalidScope(_)) => EXIT_INVALID_SCOPE,
        Err(TaskError::Store(_)) => EXIT_STORE_FAILURE,
    }
}
