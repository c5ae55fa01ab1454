//! Local SQLite event log of CLI invocations.
//!
//! One wide table, one row per invocation, capped at a fixed row count. The
//! CLI only ever appends, counts and clears; reading rows back is the job of
//! the external telemetry plugin. Every access holds the metrics database
//! lock for its whole duration.

use super::lock::{DEFAULT_LOCK_TIMEOUT, MetricsDbGuard, MetricsDbLock};
use crate::paths;
use crate::telemetry::OperationMetricsPayload;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Database file name inside the telemetry directory.
pub const METRICS_DB_FILENAME: &str = "cli_metrics.db";
/// Lock file name inside the telemetry directory.
pub const METRICS_LOCK_FILENAME: &str = ".cli_metrics.lock";
/// Maximum number of rows kept before new metrics are refused.
pub const DEFAULT_ROW_LIMIT: usize = 10_000;

const CREATE_OPERATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS tanzu_cli_operations (
    cli_version TEXT NOT NULL,
    os_name TEXT NOT NULL,
    os_arch TEXT NOT NULL,
    plugin_name TEXT,
    plugin_version TEXT,
    command TEXT NOT NULL,
    cli_id TEXT NOT NULL,
    command_start_ts TEXT NOT NULL,
    command_end_ts TEXT,
    target TEXT,
    name_arg TEXT,
    endpoint TEXT,
    flags TEXT,
    exit_status INTEGER,
    is_internal BOOLEAN,
    error TEXT,
    PRIMARY KEY (cli_id, command, command_start_ts)
);
";

const INSERT_OPERATION: &str = "
INSERT INTO tanzu_cli_operations (
    cli_version, os_name, os_arch, plugin_name, plugin_version, command,
    cli_id, command_start_ts, command_end_ts, target, name_arg, endpoint,
    flags, exit_status, is_internal, error
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
";

/// Column-typed projection of a payload at the storage boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOperationsRow {
    /// CLI version.
    pub cli_version: String,
    /// Operating system the row was recorded on.
    pub os_name: String,
    /// CPU architecture the row was recorded on.
    pub os_arch: String,
    /// Plugin name, empty for core commands.
    pub plugin_name: String,
    /// Plugin version, empty for core commands.
    pub plugin_version: String,
    /// Command path.
    pub command: String,
    /// CLI instance id.
    pub cli_id: String,
    /// Start time as Unix milliseconds, in text.
    pub command_start_ts: String,
    /// End time as Unix milliseconds, in text; empty if unknown.
    pub command_end_ts: String,
    /// Plugin target.
    pub target: String,
    /// Hashed first positional argument.
    pub name_arg: String,
    /// Hashed endpoint.
    pub endpoint: String,
    /// Flags JSON.
    pub flags: String,
    /// Exit status.
    pub exit_status: i32,
    /// Internal-user marker.
    pub is_internal: bool,
    /// Error text.
    pub error: String,
}

impl CliOperationsRow {
    /// Flatten `payload`, capturing OS name and architecture now.
    #[must_use]
    pub fn from_payload(payload: &OperationMetricsPayload) -> Self {
        Self {
            cli_version: payload.cli_version.clone(),
            os_name: std::env::consts::OS.to_string(),
            os_arch: std::env::consts::ARCH.to_string(),
            plugin_name: payload.plugin_name.clone(),
            plugin_version: payload.plugin_version.clone(),
            command: payload.command_name.clone(),
            cli_id: payload.cli_id.clone(),
            command_start_ts: millis_text(payload.start_time),
            command_end_ts: millis_text(payload.end_time),
            target: payload.target.clone(),
            name_arg: payload.name_arg.clone(),
            endpoint: payload.endpoint.clone(),
            flags: payload.flags.clone(),
            exit_status: payload.exit_status,
            is_internal: payload.is_internal,
            error: payload.error.clone(),
        }
    }
}

fn millis_text(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.timestamp_millis().to_string())
        .unwrap_or_default()
}

/// Handle on the metrics database in a telemetry directory.
#[derive(Debug, Clone)]
pub struct MetricsDb {
    dir: PathBuf,
    row_limit: usize,
    lock_timeout: Duration,
}

impl MetricsDb {
    /// Metrics database stored in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            row_limit: DEFAULT_ROW_LIMIT,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Metrics database in the default telemetry directory.
    pub fn from_default_dir() -> Result<Self> {
        Ok(Self::new(paths::telemetry_dir()?))
    }

    /// Override the row cap.
    #[must_use]
    pub const fn with_row_limit(mut self, row_limit: usize) -> Self {
        self.row_limit = row_limit;
        self
    }

    /// Override how long to wait for the database lock.
    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Path of the SQLite file.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.dir.join(METRICS_DB_FILENAME)
    }

    /// Path of the lock file.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(METRICS_LOCK_FILENAME)
    }

    /// Directory holding both files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn lock(&self) -> Result<MetricsDbGuard> {
        MetricsDbLock::acquire(&self.lock_path(), self.lock_timeout)
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(self.db_path())?)
    }

    /// Create the directory, database file and table if missing.
    pub fn create_schema(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let _guard = self.lock()?;
        self.connect()?.execute_batch(CREATE_OPERATIONS_TABLE)?;
        Ok(())
    }

    /// Append one row for `payload`.
    ///
    /// Fails with [`Error::ThresholdReached`] without writing when the table
    /// already holds the row cap.
    pub fn save_operation_metric(&self, payload: &OperationMetricsPayload) -> Result<()> {
        let _guard = self.lock()?;
        let conn = self.connect()?;

        let rows = row_count(&conn)?;
        if rows >= self.row_limit {
            return Err(Error::ThresholdReached {
                limit: self.row_limit,
            });
        }

        let row = CliOperationsRow::from_payload(payload);
        conn.execute(
            INSERT_OPERATION,
            params![
                row.cli_version,
                row.os_name,
                row.os_arch,
                row.plugin_name,
                row.plugin_version,
                row.command,
                row.cli_id,
                row.command_start_ts,
                row.command_end_ts,
                row.target,
                row.name_arg,
                row.endpoint,
                row.flags,
                row.exit_status,
                row.is_internal,
                row.error,
            ],
        )?;
        debug!(command = %row.command, "saved operation metric");
        Ok(())
    }

    /// Number of stored rows; zero when the database does not exist yet.
    pub fn get_row_count(&self) -> Result<usize> {
        if !self.db_path().exists() {
            return Ok(0);
        }
        let _guard = self.lock()?;
        row_count(&self.connect()?)
    }

    /// Delete every stored row.
    pub fn clear_metric_data(&self) -> Result<()> {
        if !self.db_path().exists() {
            return Ok(());
        }
        let _guard = self.lock()?;
        let deleted = self.connect()?.execute("DELETE FROM tanzu_cli_operations", [])?;
        debug!(deleted, "cleared metric data");
        Ok(())
    }
}

fn row_count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT count(*) FROM tanzu_cli_operations", [], |r| r.get(0))?;
    usize::try_from(count).map_err(|e| Error::Storage(format!("invalid row count {count}: {e}")))
}
