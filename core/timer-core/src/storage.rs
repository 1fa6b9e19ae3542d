//! Storage configuration and path management for timerthing.
//!
//! All file locations are decided here so the rest of the crate never builds
//! paths by hand. Production code uses `StorageConfig::default()`; tests use
//! `StorageConfig::with_root(temp_dir)` for isolation.

use std::path::{Path, PathBuf};

const ROOT_DIR_NAME: &str = ".timerthing";

/// Central configuration for all timerthing storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for all data (default: ~/.timerthing)
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            root: home.join(ROOT_DIR_NAME),
        }
    }
}

impl StorageConfig {
    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to items.json (every counter, in collection order).
    pub fn items_file(&self) -> PathBuf {
        self.root.join("items.json")
    }

    /// Path to groups.json (every group, in collection order).
    pub fn groups_file(&self) -> PathBuf {
        self.root.join("groups.json")
    }

    /// Path to config.json (tick and save cadence).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Path to run.lock (held by the process ticking these stores).
    pub fn run_lock_file(&self) -> PathBuf {
        self.root.join("run.lock")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Directories
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Ensures the root directory and the log directory exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        fs_err::create_dir_all(&self.root)?;
        fs_err::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
