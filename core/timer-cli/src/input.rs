//! Key input for the tick loop.
//!
//! `run` reads one command per line from stdin: a key, optionally followed by
//! the stopwatch (or group) it applies to.
//!
//! ```text
//! n              new stopwatch in the selected group
//! r Build        reset "Build"
//! x Build        cut "Build"
//! v              paste into the selected group
//! delete Work    remove group "Work" (or a stopwatch of that name)
//! g              new group
//! t Build        start/stop "Build"
//! s Work         select group "Work"
//! ```
//!
//! Without a target, `r`, `x` and `delete` act on whatever the previous line
//! pointed at.

use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use timer_core::{Command, TimerEngine};
use tracing::debug;

use crate::commands::{resolve_group, resolve_item};
use crate::error::CliError;

/// Forwards stdin lines to the returned channel. The reader thread ends with
/// stdin or when the receiver is dropped.
pub fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
        debug!("stdin closed");
    });
    rx
}

/// Applies one input line. Returns whether the engine changed.
pub fn apply_line(engine: &mut TimerEngine, line: &str) -> Result<bool, CliError> {
    let line = line.trim();
    let (key, target) = match line.split_once(char::is_whitespace) {
        Some((key, rest)) => (key, Some(rest.trim()).filter(|t| !t.is_empty())),
        None => (line, None),
    };
    if key.is_empty() {
        return Ok(false);
    }

    let command = match (key.to_ascii_lowercase().as_str(), target) {
        ("t", Some(item)) => Command::ToggleItem(resolve_item(engine, item)?),
        ("s", Some(group)) => Command::SelectGroup(resolve_group(engine, group)?),
        ("t", None) | ("s", None) => return Err(CliError::MissingTarget(key.to_string())),
        _ => {
            let command =
                Command::from_key(key).ok_or_else(|| CliError::UnknownKey(key.to_string()))?;
            if let Some(target) = target {
                point_at(engine, target)?;
            }
            command
        }
    };
    Ok(engine.dispatch(command))
}

/// Hovers the named stopwatch, or the named group when no stopwatch matches.
fn point_at(engine: &mut TimerEngine, target: &str) -> Result<(), CliError> {
    if let Ok(item_id) = resolve_item(engine, target) {
        engine.hover_item(Some(&item_id));
        engine.hover_group(None);
        return Ok(());
    }
    let group_id = resolve_group(engine, target)
        .map_err(|_| CliError::UnknownItem(target.to_string()))?;
    engine.hover_item(None);
    engine.hover_group(Some(&group_id));
    Ok(())
}
