//! Local metrics storage.
//!
//! [`MetricsDb`] owns the SQLite event log; [`MetricsDbLock`] serializes
//! access to it between threads and between CLI processes.

mod lock;
mod store;

pub use lock::{DEFAULT_LOCK_TIMEOUT, MetricsDbGuard, MetricsDbLock};
pub use store::{
    CliOperationsRow, DEFAULT_ROW_LIMIT, METRICS_DB_FILENAME, METRICS_LOCK_FILENAME, MetricsDb,
};
