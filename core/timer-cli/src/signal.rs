//! Ctrl-C handling for the tick loop.
//!
//! The handler only flips a flag; the loop notices it between ticks and saves
//! before exiting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::CliError;

#[derive(Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Registers the SIGINT handler. Can only be done once per process.
    pub fn install() -> Result<Self, CliError> {
        let signal = Self::default();
        let flag = Arc::clone(&signal.requested);
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })
        .map_err(|e| CliError::Signal(e.to_string()))?;
        Ok(signal)
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }
}
