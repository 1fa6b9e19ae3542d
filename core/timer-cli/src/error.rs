use thiserror::Error;
use timer_core::TimerError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("No item matches '{0}'")]
    UnknownItem(String),

    #[error("No group matches '{0}'")]
    UnknownGroup(String),

    #[error("The default group stays while it holds stopwatches or is the only group")]
    DefaultGroupKept,

    #[error("Unknown key '{0}'")]
    UnknownKey(String),

    #[error("'{0}' needs a stopwatch or group name")]
    MissingTarget(String),

    #[error("Failed to install signal handler: {0}")]
    Signal(String),

    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),
}
