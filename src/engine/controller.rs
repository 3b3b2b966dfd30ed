use super::config::RunConfig;
use super::governor::{Clock, RuntimeGovernor, SystemClock};
use super::mover::{MoveOutcome, Mover};
use super::paginator::Paginator;
use crate::core::{Partition, RecordId, Result};
use crate::scope::build_predicate;
use crate::storage::RecordStore;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// How a run terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Scope rejected before any read.
    InvalidScope,
    /// A read returned no records.
    Exhausted,
    /// The runtime budget ran out between batches.
    DeadlineExceeded,
    /// A page read failed; nothing more could be scanned.
    StoreUnavailable,
}

impl RunStatus {
    /// Only exhaustion is a clean, complete run.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidScope => "invalid scope",
            Self::Exhausted => "completed, no records left in scope",
            Self::DeadlineExceeded => "stopped, maximum runtime exceeded",
            Self::StoreUnavailable => "stopped, record store unavailable",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    pub total_matched: usize,
    pub total_succeeded: usize,
    pub total_failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    Moved,
    Failed,
    /// Counted only; the mover was not invoked.
    Matched,
}

/// One iteration of the scan loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchRecord {
    /// Cursor the page was read at.
    pub offset: usize,
    pub size: usize,
    pub outcome: BatchOutcome,
}

/// Everything a caller needs to surface a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub counters: RunCounters,
    /// Cursor after the last iteration.
    pub cursor: usize,
    pub batches: Vec<BatchRecord>,
    pub elapsed: Duration,
    pub dry_run: bool,
    /// Cause of an `InvalidScope` or `StoreUnavailable` termination.
    pub error: Option<String>,
}

impl RunReport {
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Cursor position before each batch, followed by the final cursor.
    pub fn cursor_progression(&self) -> Vec<usize> {
        self.batches
            .iter()
            .map(|batch| batch.offset)
            .chain(std::iter::once(self.cursor))
            .collect()
    }

    /// The three-line summary, in order.
    pub fn summary_lines(&self) -> [String; 3] {
        [
            format!(
                "Total of {} records matched the scope.",
                self.counters.total_matched
            ),
            format!(
                "Total of {} events successfully sent for reprocessing.",
                self.counters.total_succeeded
            ),
            format!(
                "Total of {} events failed to send for reprocessing.",
                self.counters.total_failed
            ),
        ]
    }
}

/// Per-iteration steps of the scan loop.
enum Step {
    Scan,
    Fetch,
    Move(Vec<RecordId>),
    Tally { size: usize, outcome: BatchOutcome },
    Stop(RunStatus),
}

/// Run Controller: the scan, move and report loop.
///
/// Batches run strictly one after another. The cursor rule:
/// - moved batch: cursor stays, the moved records left the filtered set;
/// - failed batch: cursor advances past it, so it is not retried this run;
/// - dry run: cursor advances, nothing left the set.
pub struct RunController {
    store: Arc<dyn RecordStore>,
    config: RunConfig,
    clock: Arc<dyn Clock>,
    destination: Partition,
}

impl RunController {
    /// Fails on invalid limits; the scope is validated when the run starts.
    pub fn new(store: Arc<dyn RecordStore>, config: RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            clock: Arc::new(SystemClock),
            destination: Partition::Primary,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn run(&self) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "requeue.run",
            run_id = %run_id,
            dry_run = self.config.dry_run,
            batch_size = self.config.batch_size
        );
        self.run_inner(run_id).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid) -> RunReport {
        let governor = RuntimeGovernor::start(self.clock.clone(), self.config.max_runtime);
        let mut report = RunReport {
            run_id,
            status: RunStatus::Exhausted,
            counters: RunCounters::default(),
            cursor: 0,
            batches: Vec::new(),
            elapsed: Duration::ZERO,
            dry_run: self.config.dry_run,
            error: None,
        };

        if self.config.dry_run {
            warn!(
                "NOTICE: running in dry run mode, no records will be moved. \
                 To disable dry run mode, pass --dryrun 0"
            );
        }
        if let Some(limit) = self.config.max_runtime {
            info!(
                "Program will stop after {} seconds have passed, started at {} ...",
                limit.as_secs(),
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S %Z")
            );
        }
        info!(
            "Program will run in batches of {} records ...",
            self.config.batch_size
        );

        // Validating
        let predicate = match build_predicate(&self.config.scope) {
            Ok(predicate) => predicate,
            Err(err) => {
                error!(error = %err, "scope rejected, no records were read");
                report.status = RunStatus::InvalidScope;
                report.error = Some(err.to_string());
                return self.finish(report, &governor);
            }
        };
        for line in predicate.activations() {
            info!("{}", line);
        }
        info!(predicate = %predicate.render_inline(), "scope resolved");

        let mover = Mover::new(self.store.clone(), self.destination);
        let mut paginator = Paginator::new(self.store.clone(), predicate, self.config.batch_size);
        let mut step = Step::Scan;

        loop {
            step = match step {
                Step::Scan => {
                    if governor.is_expired() {
                        info!(
                            "Stopping the program, the maximum runtime has been exceeded ({} seconds).",
                            governor.limit().map(|limit| limit.as_secs()).unwrap_or_default()
                        );
                        Step::Stop(RunStatus::DeadlineExceeded)
                    } else {
                        Step::Fetch
                    }
                }
                Step::Fetch => match paginator.fetch().await {
                    Ok(ids) => {
                        info!(
                            "Reading at offset {} ... read {} records.",
                            paginator.cursor(),
                            ids.len()
                        );
                        if ids.is_empty() {
                            Step::Stop(RunStatus::Exhausted)
                        } else {
                            Step::Move(ids)
                        }
                    }
                    Err(err) => {
                        error!(error = %err, offset = paginator.cursor(), "page read failed");
                        report.error = Some(err.to_string());
                        Step::Stop(RunStatus::StoreUnavailable)
                    }
                },
                Step::Move(ids) => {
                    let size = ids.len();
                    if self.config.dry_run {
                        Step::Tally {
                            size,
                            outcome: BatchOutcome::Matched,
                        }
                    } else {
                        let outcome = match mover.execute(&ids).await {
                            MoveOutcome::Moved => BatchOutcome::Moved,
                            MoveOutcome::Failed { .. } => BatchOutcome::Failed,
                        };
                        Step::Tally { size, outcome }
                    }
                }
                Step::Tally { size, outcome } => {
                    report.batches.push(BatchRecord {
                        offset: paginator.cursor(),
                        size,
                        outcome,
                    });
                    report.counters.total_matched += size;
                    match outcome {
                        BatchOutcome::Moved => {
                            report.counters.total_succeeded += size;
                            info!(
                                "{} events successfully sent for reprocessing. \
                                 Not increasing the offset (records were moved).",
                                size
                            );
                        }
                        BatchOutcome::Failed => {
                            report.counters.total_failed += size;
                            paginator.advance(size);
                            warn!(
                                "{} events failed to send for reprocessing. \
                                 Increasing the offset by {} (records were not moved).",
                                size, size
                            );
                        }
                        BatchOutcome::Matched => {
                            paginator.advance(size);
                            info!(
                                "{} records matched (dry run), next offset will be {}.",
                                size,
                                paginator.cursor()
                            );
                        }
                    }
                    Step::Scan
                }
                Step::Stop(status) => {
                    report.status = status;
                    break;
                }
            };
        }

        report.cursor = paginator.cursor();
        self.finish(report, &governor)
    }

    fn finish(&self, mut report: RunReport, governor: &RuntimeGovernor) -> RunReport {
        report.elapsed = governor.elapsed();
        for line in report.summary_lines() {
            info!("{}", line);
        }
        info!(
            status = ?report.status,
            batches = report.batch_count(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "run finished: {}",
            report.status
        );
        report
    }
}
