#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::DateTime;
use std::thread;
use std::time::Duration;
use tanzu_core::metrics::{METRICS_DB_FILENAME, METRICS_LOCK_FILENAME};
use tanzu_core::{Error, MetricsDb, MetricsDbLock, OperationMetricsPayload};
use tempfile::TempDir;

fn payload(cli_id: &str, start_ms: i64) -> OperationMetricsPayload {
    OperationMetricsPayload {
        cli_id: cli_id.to_string(),
        cli_version: "v1.3.0".to_string(),
        command_name: "plugin list".to_string(),
        start_time: DateTime::from_timestamp_millis(start_ms),
        end_time: DateTime::from_timestamp_millis(start_ms + 10),
        ..OperationMetricsPayload::default()
    }
}

#[test]
fn files_live_in_the_telemetry_directory() {
    let dir = TempDir::new().unwrap();
    let db = MetricsDb::new(dir.path().join("telemetry"));
    db.create_schema().unwrap();

    assert!(dir.path().join("telemetry").join(METRICS_DB_FILENAME).exists());
    assert!(dir.path().join("telemetry").join(METRICS_LOCK_FILENAME).exists());
}

#[test]
fn concurrent_writers_are_serialized() {
    let dir = TempDir::new().unwrap();
    let db = MetricsDb::new(dir.path());
    db.create_schema().unwrap();

    let writers: Vec<_> = (0..4)
        .map(|writer| {
            let db = db.clone();
            thread::spawn(move || {
                for ts in 0..5 {
                    db.save_operation_metric(&payload(&format!("cli-{writer}"), ts))
                        .unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(db.get_row_count().unwrap(), 20);
}

#[test]
fn threshold_blocks_inserts_until_cleared() {
    let dir = TempDir::new().unwrap();
    let db = MetricsDb::new(dir.path()).with_row_limit(2);
    db.create_schema().unwrap();
    db.save_operation_metric(&payload("a", 1)).unwrap();
    db.save_operation_metric(&payload("a", 2)).unwrap();

    let err = db.save_operation_metric(&payload("a", 3)).unwrap_err();
    assert!(matches!(err, Error::ThresholdReached { .. }));
    assert_eq!(db.get_row_count().unwrap(), 2);

    db.clear_metric_data().unwrap();
    db.save_operation_metric(&payload("a", 3)).unwrap();
    assert_eq!(db.get_row_count().unwrap(), 1);
}

#[test]
fn lock_held_past_timeout_fails_then_recovers() {
    let dir = TempDir::new().unwrap();
    let lock_path = dir.path().join(METRICS_LOCK_FILENAME);

    let holder = {
        let lock_path = lock_path.clone();
        thread::spawn(move || {
            let _guard = MetricsDbLock::acquire(&lock_path, Duration::from_secs(3)).unwrap();
            thread::sleep(Duration::from_millis(600));
        })
    };
    thread::sleep(Duration::from_millis(100));

    let err = MetricsDbLock::acquire(&lock_path, Duration::from_millis(200)).unwrap_err();
    assert!(err.to_string().contains("timeout waiting for lock"));

    holder.join().unwrap();
    assert!(MetricsDbLock::acquire(&lock_path, Duration::from_secs(3)).is_ok());
}
