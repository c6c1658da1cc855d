//! Cross-process mutual exclusion via a liveness-checked lock file.
//!
//! The lock is a JSON record of the holding process id. A record whose
//! holder is no longer alive is stale and self-healed by removal, so a
//! crashed agent never blocks the next start.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{AppError, Result};

/// The persisted lock record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    /// Process id of the holder.
    pub pid: u32,
    /// When the holder acquired the lock.
    pub started_at: DateTime<Utc>,
}

/// Single-instance guard over a lock file path.
#[derive(Debug, Clone)]
pub struct ProcessGuard {
    lock_path: PathBuf,
}

impl ProcessGuard {
    /// Construct a guard over the given lock file path.
    #[must_use]
    pub fn new(lock_path: PathBuf) -> Self {
        Self { lock_path }
    }

    /// Write a lock record for the current process, overwriting any
    /// existing record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the record cannot be written.
    pub fn write_lock(&self) -> Result<()> {
        let record = LockRecord {
            pid: std::process::id(),
            started_at: Utc::now(),
        };
        let raw = serde_json::to_string(&record)
            .map_err(|err| AppError::Io(format!("cannot serialize lock record: {err}")))?;
        fs::write(&self.lock_path, raw)
            .map_err(|err| AppError::Io(format!("cannot write lock file: {err}")))?;
        Ok(())
    }

    /// Read the lock record, if one exists.
    ///
    /// A malformed record is treated as stale: it is removed and `None`
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file exists but cannot be read.
    pub fn read_lock(&self) -> Result<Option<LockRecord>> {
        let raw = match fs::read_to_string(&self.lock_path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AppError::Io(format!("cannot read lock file: {err}"))),
        };
        match serde_json::from_str::<LockRecord>(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                warn!(%err, "malformed lock record, removing");
                self.remove_lock()?;
                Ok(None)
            }
        }
    }

    /// Remove the lock record. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file exists but cannot be removed.
    pub fn remove_lock(&self) -> Result<()> {
        match fs::remove_file(&self.lock_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AppError::Io(format!("cannot remove lock file: {err}"))),
        }
    }

    /// The recorded holder, confirmed alive by a liveness probe.
    ///
    /// A record whose process is no longer alive is removed and `None`
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` on a file-system failure.
    pub fn get_holder(&self) -> Result<Option<u32>> {
        let Some(record) = self.read_lock()? else {
            return Ok(None);
        };
        if process_alive(record.pid) {
            return Ok(Some(record.pid));
        }
        info!(pid = record.pid, "stale lock record for dead process, removing");
        self.remove_lock()?;
        Ok(None)
    }

    /// Acquire the lock for the current process.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Conflict` if a live holder exists, including a
    /// previous un-released acquisition by this same process.
    pub fn acquire(&self) -> Result<()> {
        if let Some(pid) = self.get_holder()? {
            return Err(AppError::Conflict(format!(
                "another agent instance is running (pid {pid})"
            )));
        }
        self.write_lock()
    }

    /// Release the lock.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` on a file-system failure.
    pub fn release(&self) -> Result<()> {
        self.remove_lock()
    }

    /// Send a graceful termination signal to the recorded live holder.
    ///
    /// Returns the signalled pid, or `None` when no live holder exists.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the signal cannot be delivered.
    pub fn stop_holder(&self) -> Result<Option<u32>> {
        let Some(pid) = self.get_holder()? else {
            return Ok(None);
        };
        terminate(pid)?;
        info!(pid, "sent termination signal to agent holder");
        Ok(Some(pid))
    }
}

/// kill(pid, 0) liveness probe.
#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok()
}

/// Without a cheap liveness probe, a readable record is treated as live
/// so two instances never poll concurrently.
#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

#[cfg(unix)]
fn terminate(pid: u32) -> Result<()> {
    let pid = i32::try_from(pid)
        .map_err(|_| AppError::Io(format!("pid {pid} out of range")))?;
    nix::sys::signal::kill(
        nix::unistd::Pid::from_raw(pid),
        nix::sys::signal::Signal::SIGTERM,
    )
    .map_err(|err| AppError::Io(format!("cannot signal pid {pid}: {err}")))
}

#[cfg(not(unix))]
fn terminate(pid: u32) -> Result<()> {
    Err(AppError::Io(format!(
        "cannot signal pid {pid} on this platform"
    )))
}
