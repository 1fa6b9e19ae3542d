//! Error types for timer-core operations.
//!
//! Three families matter to callers:
//! - validation errors (a stale id or a refused removal from the UI layer),
//! - persistence errors (I/O while saving or reading the stores),
//! - load errors (a store file exists but cannot be understood).

use std::path::PathBuf;

/// All errors that can occur in timer-core operations.
#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    // ─────────────────────────────────────────────────────────────────────
    // Validation Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Clipboard does not hold item {0}")]
    ClipboardMismatch(String),

    #[error("Default group cannot be removed while {0}")]
    DefaultGroupRequired(String),

    // ─────────────────────────────────────────────────────────────────────
    // Persistence Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Persistence {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not saving: the stores failed to load ({details})")]
    SaveBlocked { details: String },

    #[error("Timer is running in process {pid} (lock: {path})")]
    RunActive { pid: u32, path: PathBuf },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Load Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Malformed {resource} store: {details}")]
    Load { resource: String, details: String },

    #[error("Configuration file malformed: {path}: {details}")]
    Config { path: PathBuf, details: String },
}

impl TimerError {
    /// True for errors caused by a reference that does not resolve.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TimerError::ItemNotFound(_)
                | TimerError::GroupNotFound(_)
                | TimerError::ClipboardMismatch(_)
                | TimerError::DefaultGroupRequired(_)
        )
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        TimerError::Persistence {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using TimerError.
pub type Result<T> = std::result::Result<T, TimerError>;
