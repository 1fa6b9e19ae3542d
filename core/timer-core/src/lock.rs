//! Single-writer lock for the tick loop.
//!
//! A running tick loop keeps the stores in memory and rewrites them on its own
//! cadence, so anything another process saved in between would be lost. The
//! loop holds `<root>/run.lock` for its lifetime and one-shot writers check it
//! first.
//!
//! The lock file is JSON: `{ "pid": 4242, "started_at": "..." }`. A lock whose
//! pid no longer exists (crash, `kill -9`) is stale and gets taken over.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, TimerError};
use crate::storage::StorageConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

/// Proof that this process owns the stores. The lock file is removed on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    info: LockInfo,
}

impl RunLock {
    /// Takes the lock, clearing a stale one first.
    ///
    /// Fails with [`TimerError::RunActive`] if a live process holds it.
    pub fn acquire(storage: &StorageConfig) -> Result<Self> {
        let path = storage.run_lock_file();
        fs::create_dir_all(storage.root())
            .map_err(|e| TimerError::io(format!("creating {}", storage.root().display()), e))?;
        let info = LockInfo {
            pid: std::process::id(),
            started_at: Utc::now(),
        };

        // The second pass only runs after a stale lock was removed.
        for _ in 0..2 {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(file) => {
                    write_info(file, &info, &path)?;
                    debug!(pid = info.pid, path = %path.display(), "Run lock acquired");
                    return Ok(Self { path, info });
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    if let Some(holder) = live_holder(&path) {
                        return Err(TimerError::RunActive {
                            pid: holder.pid,
                            path,
                        });
                    }
                    warn!(path = %path.display(), "Removing stale run lock");
                    remove_lock_file(&path)?;
                }
                Err(err) => {
                    return Err(TimerError::io(format!("creating {}", path.display()), err));
                }
            }
        }

        Err(TimerError::io(
            format!("creating {}", path.display()),
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                "lock reappeared after clearing a stale one",
            ),
        ))
    }

    /// Fails with [`TimerError::RunActive`] while a live process holds the lock.
    pub fn ensure_free(storage: &StorageConfig) -> Result<()> {
        let path = storage.run_lock_file();
        match live_holder(&path) {
            Some(holder) => Err(TimerError::RunActive {
                pid: holder.pid,
                path,
            }),
            None => Ok(()),
        }
    }

    /// The live holder, if any.
    pub fn holder(storage: &StorageConfig) -> Option<LockInfo> {
        live_holder(&storage.run_lock_file())
    }

    pub fn info(&self) -> &LockInfo {
        &self.info
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        match remove_lock_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Run lock released"),
            Err(err) => warn!(error = %err, "Failed to release run lock"),
        }
    }
}

fn write_info(mut file: fs::File, info: &LockInfo, path: &Path) -> Result<()> {
    let body = serde_json::to_vec(info).map_err(|e| TimerError::Json {
        context: "encoding run lock".to_string(),
        source: e,
    })?;
    if let Err(err) = file.write_all(&body) {
        // A half-written lock would read as stale anyway; don't leave it around.
        if let Err(cleanup) = remove_lock_file(path) {
            warn!(error = %cleanup, "Failed to remove partial run lock");
        }
        return Err(TimerError::io(format!("writing {}", path.display()), err));
    }
    Ok(())
}

fn remove_lock_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(TimerError::io(format!("removing {}", path.display()), err)),
    }
}

/// Reads the lock and returns it only if its process is still alive.
/// Unreadable locks count as stale.
fn live_holder(path: &Path) -> Option<LockInfo> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(error = %err, "Run lock unreadable, treating as stale");
            }
            return None;
        }
    };

    match serde_json::from_str::<LockInfo>(&content) {
        Ok(info) if is_pid_alive(info.pid) => Some(info),
        Ok(info) => {
            debug!(pid = info.pid, "Run lock holder has exited");
            None
        }
        Err(err) => {
            warn!(error = %err, path = %path.display(), "Run lock malformed, treating as stale");
            None
        }
    }
}

pub fn is_pid_alive(pid: u32) -> bool {
    #[cfg(unix)]
    {
        let Ok(pid) = libc::pid_t::try_from(pid) else {
            return false;
        };
        if pid <= 0 {
            return false;
        }
        // Signal 0 only checks existence. EPERM means alive but not ours.
        let result = unsafe { libc::kill(pid, 0) };
        result == 0 || io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }
    #[cfg(not(unix))]
    {
        // No portable existence check; a leftover lock has to be deleted by hand.
        let _ = pid;
        true
    }
}
