//! # timer-core
//!
//! Core library for timerthing: named stopwatch counters sorted into groups,
//! one group selected at a time, ticked once per second and saved to disk.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency.
//! - **Not thread-safe**: One owner drives [`TimerEngine`]; ticks and input
//!   handling run on the same thread.
//! - **Graceful degradation**: Missing files load as empty state; malformed
//!   stores are discarded per file instead of aborting startup.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use timer_core::{load_config, StorageConfig, TimerEngine};
//!
//! let storage = StorageConfig::default();
//! let mut engine = TimerEngine::open(storage.clone(), load_config(&storage));
//! engine.on_tick();
//! engine.save_now()?;
//! ```

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod format;
pub mod lock;
pub mod selection;
pub mod storage;
pub mod store;
pub mod tick;
pub mod types;

pub use config::{load_config, read_config, save_config, TimerConfig};
pub use dispatch::Command;
pub use engine::{ItemHandle, LoadReport, TimerEngine};
pub use error::{Result, TimerError};
pub use format::format_seconds;
pub use lock::{LockInfo, RunLock};
pub use storage::StorageConfig;
pub use store::{LoadedState, TimerStore};
pub use tick::{TickEngine, TickOutcome};
pub use types::*;
