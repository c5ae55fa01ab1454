//! Exclusive access to the metrics database across threads and processes.
//!
//! SQLite offers no write coordination between independent CLI processes, so
//! every read or write of the metrics database happens under
//! [`MetricsDbLock::acquire`]. The returned guard combines two layers: an
//! in-process gate (one per lock file path) and an OS advisory lock on the
//! lock file. Both are released when the guard is dropped.

use crate::{Error, Result};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, OnceLock, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// How long callers wait for the lock before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(3);

/// Entry point for acquiring the metrics database lock.
#[derive(Debug, Clone, Copy)]
pub struct MetricsDbLock;

impl MetricsDbLock {
    /// Acquire the lock backed by the file at `path`, waiting at most `timeout`.
    ///
    /// The wait covers both layers. On timeout the error message contains
    /// `timeout waiting for lock` and nothing stays locked.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<MetricsDbGuard> {
        let deadline = Instant::now() + timeout;
        let gate = gate_for(path);
        gate.enter(path, deadline)?;

        match lock_file(path, deadline) {
            Ok(file) => {
                debug!(path = %path.display(), "acquired metrics db lock");
                Ok(MetricsDbGuard {
                    file: Some(file),
                    gate: Some(gate),
                })
            },
            Err(err) => {
                gate.leave();
                Err(err)
            },
        }
    }
}

/// Holds the metrics database lock until released or dropped.
#[derive(Debug)]
pub struct MetricsDbGuard {
    file: Option<File>,
    gate: Option<Arc<Gate>>,
}

impl MetricsDbGuard {
    /// Release the file lock, then the in-process gate. Releasing twice is a no-op.
    pub fn release(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = FileExt::unlock(&file);
        }
        if let Some(gate) = self.gate.take() {
            gate.leave();
        }
    }
}

impl Drop for MetricsDbGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[derive(Debug, Default)]
struct Gate {
    held: Mutex<bool>,
    released: Condvar,
}

impl Gate {
    fn enter(&self, path: &Path, deadline: Instant) -> Result<()> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while *held {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timeout_error(path));
            }
            held = self
                .released
                .wait_timeout(held, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *held = true;
        Ok(())
    }

    fn leave(&self) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        *held = false;
        drop(held);
        self.released.notify_one();
    }
}

fn gate_for(path: &Path) -> Arc<Gate> {
    static GATES: OnceLock<Mutex<HashMap<PathBuf, Arc<Gate>>>> = OnceLock::new();
    let mut gates = GATES
        .get_or_init(Mutex::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    Arc::clone(gates.entry(path.to_path_buf()).or_default())
}

/// Take the OS lock on a helper thread so the wait can be bounded.
///
/// If the helper wins the lock after the caller stopped waiting, it unlocks
/// straight away instead of leaking it.
fn lock_file(path: &Path, deadline: Instant) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(path)?;

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = file.lock_exclusive().map(|()| file);
        if let Err(mpsc::SendError(Ok(file))) = tx.send(result) {
            let _ = FileExt::unlock(&file);
        }
    });

    let remaining = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(remaining) {
        Ok(Ok(file)) => Ok(file),
        Ok(Err(err)) => Err(Error::Io(err)),
        Err(_) => Err(timeout_error(path)),
    }
}

fn timeout_error(path: &Path) -> Error {
    Error::Timeout(format!("timeout waiting for lock {}", path.display()))
}
