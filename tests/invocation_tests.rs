mod common;

use common::{MovePolicy, StubStore};
use logrequeue::core::{FailedRecord, Partition};
use logrequeue::engine::{ManualClock, RunStatus};
use logrequeue::invocation::{
    ResendJob, ResendRequest, ResendSettings, ResendTask, TaskError, TaskOutcome, exit_code, resend,
};
use logrequeue::storage::{InMemoryRecordStore, RecordStore, SnapshotManager};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn seeded_store() -> Arc<InMemoryRecordStore> {
    let records = vec![
        FailedRecord::new(1, 401, "\\core\\event\\user_loggedin", 1_698_982_800),
        FailedRecord::new(2, 401, "\\core\\event\\course_viewed", 1_698_982_810),
        FailedRecord::new(3, 500, "\\core\\event\\user_loggedin", 1_698_982_820),
        FailedRecord::new(4, 403, "\\core\\event\\user_loggedin", 1_698_982_830),
    ];
    Arc::new(InMemoryRecordStore::with_failed(records).unwrap())
}

fn settings() -> ResendSettings {
    ResendSettings {
        runtime: 0,
        error_type: String::new(),
        event_name: String::new(),
        date_from: 0,
        date_to: 0,
        batch: 10,
    }
}

#[tokio::test]
async fn test_on_demand_defaults_to_dry_run() {
    let store = seeded_store();

    let report = resend(store.clone(), &ResendRequest::default()).await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.counters.total_matched, 4);
    assert_eq!(exit_code(report.status), 0);
    assert_eq!(store.count(Partition::Failed).await.unwrap(), 4);
    assert_eq!(store.count(Partition::Primary).await.unwrap(), 0);
}

#[tokio::test]
async fn test_on_demand_moves_scoped_records() {
    let store = seeded_store();
    let request = ResendRequest {
        error_type: Some("401, 403".to_string()),
        event_name: Some("\\core\\event\\user_loggedin".to_string()),
        dry_run: false,
        ..ResendRequest::default()
    };

    let report = resend(store.clone(), &request).await.unwrap();

    assert_eq!(report.status, RunStatus::Exhausted);
    assert_eq!(report.counters.total_succeeded, 2);
    assert_eq!(exit_code(report.status), 0);

    let primary: Vec<_> = store.primary_records().await.iter().map(|r| r.id).collect();
    assert_eq!(primary, vec![1, 4]);
    let failed: Vec<_> = store.failed_records().await.iter().map(|r| r.id).collect();
    assert_eq!(failed, vec![2, 3]);
}

#[tokio::test]
async fn test_on_demand_inverted_dates_exit_with_validation_status() {
    let store = seeded_store();
    let request = ResendRequest {
        date_from: Some(1_698_982_823),
        date_to: Some(1_698_982_800),
        dry_run: false,
        ..ResendRequest::default()
    };

    let report = resend(store.clone(), &request).await.unwrap();

    assert_eq!(report.status, RunStatus::InvalidScope);
    assert_eq!(exit_code(report.status), 2);
    assert_eq!(store.count(Partition::Failed).await.unwrap(), 4);
}

#[tokio::test]
async fn test_on_demand_zero_runtime_exits_with_deadline_status() {
    let store = seeded_store();
    let request = ResendRequest {
        dry_run: false,
        max_runtime: Some(0),
        ..ResendRequest::default()
    };

    let report = resend(store.clone(), &request).await.unwrap();

    assert_eq!(report.status, RunStatus::DeadlineExceeded);
    assert_eq!(exit_code(report.status), 3);
    assert_eq!(report.batch_count(), 0);
}

#[tokio::test]
async fn test_on_demand_store_outage_exits_with_failure_status() {
    let store = Arc::new(StubStore::new(3, MovePolicy::AlwaysSucceed).unavailable());
    let request = ResendRequest {
        dry_run: false,
        ..ResendRequest::default()
    };

    let report = resend(store, &request).await.unwrap();

    assert_eq!(exit_code(report.status), 1);
}

#[tokio::test]
async fn test_scheduled_trigger_completes_and_is_never_dry_run() {
    let store = seeded_store();
    let task = ResendTask::new(store.clone());

    let outcome = task.trigger(&settings()).await.unwrap();

    assert_eq!(outcome, TaskOutcome::Completed);
    assert_eq!(store.count(Partition::Failed).await.unwrap(), 0);
    assert_eq!(store.count(Partition::Primary).await.unwrap(), 4);
}

#[tokio::test]
async fn test_scheduled_trigger_defers_when_runtime_runs_out() {
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(
        StubStore::new(30, MovePolicy::AlwaysSucceed)
            .with_clock(clock.clone(), Duration::from_secs(10)),
    );
    let task = ResendTask::new(store.clone()).with_clock(clock);
    let settings = ResendSettings {
        runtime: 15,
        ..settings()
    };

    let outcome = task.trigger(&settings).await.unwrap();

    assert_eq!(outcome, TaskOutcome::Deferred);
    assert_eq!(store.moves(), 2);
    assert_eq!(store.remaining(), 10);

    // The next tick picks up where this one stopped.
    let outcome = ResendTask::new(store.clone()).trigger(&settings).await.unwrap();
    assert_eq!(outcome, TaskOutcome::Completed);
    assert_eq!(store.remaining(), 0);
}

#[tokio::test]
async fn test_scheduled_inverted_dates_are_not_retryable() {
    let store = Arc::new(StubStore::new(3, MovePolicy::AlwaysSucceed));
    let settings = ResendSettings {
        date_from: 1000,
        date_to: 500,
        ..settings()
    };

    let err = ResendTask::new(store.clone()).trigger(&settings).await.unwrap_err();

    assert!(matches!(err, TaskError::InvalidScope(_)));
    assert!(!err.is_retryable());
    assert_eq!(store.fetches(), 0);
}

#[tokio::test]
async fn test_scheduled_malformed_settings_fail_before_run() {
    let store = Arc::new(StubStore::new(3, MovePolicy::AlwaysSucceed));
    let settings = ResendSettings {
        error_type: "401,unauthorised".to_string(),
        ..settings()
    };

    let err = ResendTask::new(store.clone()).trigger(&settings).await.unwrap_err();

    assert!(matches!(err, TaskError::InvalidSettings(_)));
    assert!(!err.is_retryable());
    assert_eq!(store.fetches(), 0);
}

#[tokio::test]
async fn test_scheduled_store_outage_is_retryable() {
    let store = Arc::new(StubStore::new(3, MovePolicy::AlwaysSucceed).unavailable());

    let err = ResendTask::new(store).trigger(&settings()).await.unwrap_err();

    assert!(matches!(err, TaskError::Store(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_settings_file_drives_queued_job() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    fs::write(
        &path,
        r#"{"resendtaskerrortype": "500", "resendbatch": 1, "resendtaskruntime": 0}"#,
    )
    .unwrap();

    let settings = ResendSettings::load(&path).unwrap();
    let store = seeded_store();
    let task = ResendTask::new(store.clone());

    let job: ResendJob = task.queue(&settings);
    assert_eq!(job.errortype, "500");
    assert_eq!(job.batch, 1);

    let report = task.execute(&job).await.unwrap();
    assert!(!report.dry_run);
    assert_eq!(report.counters.total_succeeded, 1);
    let failed: Vec<_> = store.failed_records().await.iter().map(|r| r.id).collect();
    assert_eq!(failed, vec![1, 2, 4]);
}

#[tokio::test]
async fn test_moved_records_survive_a_snapshot_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let snapshots = SnapshotManager::new(temp_dir.path().join("store.json"));
    let store = seeded_store();

    ResendTask::new(store.clone()).trigger(&settings()).await.unwrap();
    snapshots.save(&store.snapshot().await).unwrap();

    let restored = InMemoryRecordStore::from_snapshot(snapshots.load().unwrap().unwrap()).unwrap();
    assert_eq!(restored.count(Partition::Failed).await.unwrap(), 0);
    assert_eq!(restored.count(Partition::Primary).await.unwrap(), 4);
}
