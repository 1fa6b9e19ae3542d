//! Subcommand handlers.
//!
//! Each handler works on an already-open engine and returns the text to print.
//! Mutating one-shot commands refuse to touch the stores while a `run` holds
//! the run lock, and save before returning; `run` saves on its cadence and
//! once more on shutdown.

use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Duration;

use timer_core::format::format_seconds;
use timer_core::{Group, Item, RunLock, TimerConfig, TimerEngine, DEFAULT_GROUP_ID};
use tracing::{error, info, warn};

use crate::error::CliError;
use crate::input;
use crate::signal::ShutdownSignal;

/// Finds an item by exact id, then by exact name.
pub fn resolve_item(engine: &TimerEngine, key: &str) -> Result<String, CliError> {
    engine
        .item(key)
        .or_else(|| engine.items().iter().find(|i| i.name == key))
        .map(|i| i.id.clone())
        .ok_or_else(|| CliError::UnknownItem(key.to_string()))
}

/// Finds a group by exact id, then by display name.
pub fn resolve_group(engine: &TimerEngine, key: &str) -> Result<String, CliError> {
    engine
        .group(key)
        .or_else(|| engine.groups().iter().find(|g| g.display_name == key))
        .map(|g| g.id.clone())
        .ok_or_else(|| CliError::UnknownGroup(key.to_string()))
}

/// A running tick loop would overwrite whatever we save.
fn ensure_writable(engine: &TimerEngine) -> Result<(), CliError> {
    RunLock::ensure_free(engine.storage())?;
    Ok(())
}

fn describe_item(item: &Item) -> String {
    format!(
        "  {}  {:<20} {:>12} {:>12} avg {:>12}{}",
        item.id,
        item.name,
        format_seconds(item.elapsed_seconds),
        format_seconds(item.total_seconds),
        format_seconds(item.average_reset_seconds),
        if item.is_active { "  (running)" } else { "" }
    )
}

fn describe_group(group: &Group) -> String {
    format!(
        "{}  {}{}",
        group.id,
        group.display_name,
        if group.is_selected_exclusive {
            "  [selected]"
        } else {
            ""
        }
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tick loop
// ─────────────────────────────────────────────────────────────────────────────

/// Ticks until `max_ticks` is reached or shutdown is requested, then saves.
///
/// Lines arriving on `input` are applied between ticks. The caller holds the
/// run lock for the duration.
pub fn run(
    engine: &mut TimerEngine,
    config: &TimerConfig,
    max_ticks: Option<u64>,
    shutdown: &ShutdownSignal,
    input: &Receiver<String>,
) -> Result<String, CliError> {
    let interval = Duration::from_millis(config.tick_interval_ms);
    info!(
        tick_interval_ms = config.tick_interval_ms,
        save_interval_ticks = config.save_interval_ticks,
        "Tick loop started"
    );

    let mut ticked = 0u64;
    while !shutdown.is_requested() && max_ticks.map_or(true, |max| ticked < max) {
        thread::sleep(interval);
        if shutdown.is_requested() {
            break;
        }
        while let Ok(line) = input.try_recv() {
            match input::apply_line(engine, &line) {
                Ok(true) => println!("{}", engine.summary_display()),
                Ok(false) => {}
                Err(err) => eprintln!("timerthing: {}", err),
            }
        }
        engine.on_tick();
        ticked += 1;
        if let Some(message) = engine.take_notification() {
            warn!(message = %message, "Persistence problem");
            eprintln!("timerthing: {}", message);
        }
    }

    if let Err(err) = engine.save_now() {
        error!(error = %err, "Final save failed");
        return Err(err.into());
    }
    info!(ticks = ticked, "Tick loop stopped");
    Ok(format!("Stopped after {} ticks", ticked))
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────────────

/// Lists the items of one group (the selected one by default).
pub fn list(engine: &mut TimerEngine, group: Option<&str>, json: bool) -> Result<String, CliError> {
    if let Some(key) = group {
        let group_id = resolve_group(engine, key)?;
        engine.select_group(&group_id);
    }
    let visible: Vec<Item> = engine.visible_items().into_iter().cloned().collect();
    if json {
        return Ok(serde_json::to_string_pretty(&visible)?);
    }

    let mut lines = Vec::new();
    if let Some(selected) = engine.selected_group() {
        lines.push(describe_group(selected));
    }
    if visible.is_empty() {
        lines.push("  (no stopwatches)".to_string());
    }
    lines.extend(visible.iter().map(describe_item));
    lines.push(engine.summary_display());
    Ok(lines.join("\n"))
}

pub fn list_groups(engine: &TimerEngine, json: bool) -> Result<String, CliError> {
    if json {
        return Ok(serde_json::to_string_pretty(engine.groups())?);
    }
    Ok(engine
        .groups()
        .iter()
        .map(describe_group)
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Summary line for an item, or for a group's visible items.
pub fn summary(
    engine: &mut TimerEngine,
    item: Option<&str>,
    group: Option<&str>,
) -> Result<String, CliError> {
    if let Some(key) = group {
        let group_id = resolve_group(engine, key)?;
        engine.select_group(&group_id);
    }
    if let Some(key) = item {
        let item_id = resolve_item(engine, key)?;
        engine.hover_item(Some(&item_id));
    }
    Ok(engine.summary_display())
}

// ─────────────────────────────────────────────────────────────────────────────
// Item mutations
// ─────────────────────────────────────────────────────────────────────────────

pub fn add(engine: &mut TimerEngine, name: &str, group: Option<&str>) -> Result<String, CliError> {
    ensure_writable(engine)?;
    let group_id = match group {
        Some(key) => resolve_group(engine, key)?,
        None => engine
            .selected_group()
            .map_or_else(|| DEFAULT_GROUP_ID.to_string(), |g| g.id.clone()),
    };
    let item = engine.add_item(name, &group_id).clone();
    engine.save_now()?;
    Ok(format!("Added {} ({})", item.name, item.id))
}

pub fn remove(engine: &mut TimerEngine, key: &str) -> Result<String, CliError> {
    ensure_writable(engine)?;
    let id = resolve_item(engine, key)?;
    engine.remove_item(&id);
    engine.save_now()?;
    Ok(format!("Removed {}", id))
}

pub fn reset(engine: &mut TimerEngine, key: &str) -> Result<String, CliError> {
    ensure_writable(engine)?;
    let id = resolve_item(engine, key)?;
    let changed = engine.reset_item(&id);
    engine.save_now()?;
    let message = match engine.item(&id) {
        Some(item) if changed => format!(
            "Reset {} (laps {}, avg {})",
            item.name,
            item.reset_count,
            format_seconds(item.average_reset_seconds)
        ),
        _ => "Nothing to reset".to_string(),
    };
    Ok(message)
}

pub fn toggle(engine: &mut TimerEngine, key: &str) -> Result<String, CliError> {
    ensure_writable(engine)?;
    let id = resolve_item(engine, key)?;
    let running = engine
        .toggle_item_active(&id)
        .ok_or_else(|| CliError::UnknownItem(key.to_string()))?;
    engine.save_now()?;
    Ok(format!(
        "{} is now {}",
        key,
        if running { "running" } else { "stopped" }
    ))
}

pub fn rename(engine: &mut TimerEngine, key: &str, name: &str) -> Result<String, CliError> {
    ensure_writable(engine)?;
    let id = resolve_item(engine, key)?;
    engine.rename_item(&id, name);
    engine.save_now()?;
    Ok(format!("Renamed {}", id))
}

/// Cut + paste into another group.
pub fn move_item(engine: &mut TimerEngine, key: &str, group: &str) -> Result<String, CliError> {
    ensure_writable(engine)?;
    let id = resolve_item(engine, key)?;
    let group_id = resolve_group(engine, group)?;
    let handle = engine
        .cut_item(&id)
        .ok_or_else(|| CliError::UnknownItem(key.to_string()))?;
    engine.paste_item(&handle, &group_id);
    engine.save_now()?;
    Ok(format!("Moved {} to {}", id, group_id))
}

// ─────────────────────────────────────────────────────────────────────────────
// Group mutations
// ─────────────────────────────────────────────────────────────────────────────

pub fn add_group(engine: &mut TimerEngine, name: &str) -> Result<String, CliError> {
    ensure_writable(engine)?;
    let group = engine.add_group(name).clone();
    engine.save_now()?;
    Ok(format!("Added group {} ({})", group.display_name, group.id))
}

pub fn remove_group(engine: &mut TimerEngine, key: &str) -> Result<String, CliError> {
    ensure_writable(engine)?;
    let id = resolve_group(engine, key)?;
    if !engine.remove_group(&id) {
        return Err(CliError::DefaultGroupKept);
    }
    engine.save_now()?;
    Ok(format!("Removed group {}", id))
}

pub fn rename_group(engine: &mut TimerEngine, key: &str, name: &str) -> Result<String, CliError> {
    ensure_writable(engine)?;
    let id = resolve_group(engine, key)?;
    engine.rename_group(&id, name);
    engine.save_now()?;
    Ok(format!("Renamed group {}", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::TempDir;
    use timer_core::{StorageConfig, TimerError};

    fn engine(temp: &TempDir) -> TimerEngine {
        TimerEngine::open(
            StorageConfig::with_root(temp.path().to_path_buf()),
            TimerConfig::default(),
        )
    }

    #[test]
    fn test_add_then_list_by_name() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(&temp);

        let out = add(&mut engine, "Reading", None).unwrap();
        assert!(out.starts_with("Added Reading"));

        let listing = list(&mut engine, None, false).unwrap();
        assert!(listing.contains("Reading"));
        assert!(listing.contains("[selected]"));
        assert!(listing.ends_with("Group Total : 0:00:00:00"));
    }

    #[test]
    fn test_mutations_persist_between_opens() {
        let temp = TempDir::new().unwrap();
        let mut first = engine(&temp);
        add_group(&mut first, "Work").unwrap();
        add(&mut first, "Build", Some("Work")).unwrap();
        toggle(&mut first, "Build").unwrap();

        let mut second = engine(&temp);
        let id = resolve_item(&second, "Build").unwrap();
        assert!(second.item(&id).unwrap().is_active);
        let json = list(&mut second, Some("Work"), true).unwrap();
        let parsed: Vec<Item> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_move_item_between_groups() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(&temp);
        add_group(&mut engine, "Side").unwrap();
        add(&mut engine, "Task", None).unwrap();

        move_item(&mut engine, "Task", "Side").unwrap();
        let id = resolve_item(&engine, "Task").unwrap();
        let side = resolve_group(&engine, "Side").unwrap();
        assert_eq!(engine.item(&id).unwrap().group_id, side);
        assert!(engine.clipboard().is_none());
    }

    #[test]
    fn test_remove_group_moves_items_home() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(&temp);
        add_group(&mut engine, "Temp").unwrap();
        add(&mut engine, "Stray", Some("Temp")).unwrap();

        remove_group(&mut engine, "Temp").unwrap();
        let id = resolve_item(&engine, "Stray").unwrap();
        assert_eq!(engine.item(&id).unwrap().group_id, DEFAULT_GROUP_ID);
    }

    #[test]
    fn test_unknown_references_are_errors_at_the_cli() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(&temp);
        assert!(matches!(
            remove(&mut engine, "nope"),
            Err(CliError::UnknownItem(_))
        ));
        assert!(matches!(
            add(&mut engine, "x", Some("nope")),
            Err(CliError::UnknownGroup(_))
        ));
    }

    #[test]
    fn test_summary_for_item() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(&temp);
        add(&mut engine, "Solo", None).unwrap();
        let out = summary(&mut engine, Some("Solo"), None).unwrap();
        assert_eq!(out, "Total : 0:00:00:00 Avg : 0:00:00:00");
    }

    #[test]
    fn test_reset_reports_nothing_for_idle_item() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(&temp);
        add(&mut engine, "Idle", None).unwrap();
        assert_eq!(reset(&mut engine, "Idle").unwrap(), "Nothing to reset");
    }

    #[test]
    fn test_bounded_run_ticks_and_saves() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(&temp);
        add(&mut engine, "Clock", None).unwrap();
        toggle(&mut engine, "Clock").unwrap();
        let config = TimerConfig {
            tick_interval_ms: 1,
            ..TimerConfig::default()
        };

        let (_tx, rx) = mpsc::channel();
        let out = run(&mut engine, &config, Some(3), &ShutdownSignal::default(), &rx).unwrap();
        assert_eq!(out, "Stopped after 3 ticks");

        let reopened = TimerEngine::open(engine.storage().clone(), TimerConfig::default());
        let id = resolve_item(&reopened, "Clock").unwrap();
        assert_eq!(reopened.item(&id).unwrap().total_seconds, 3);
    }

    #[test]
    fn test_run_stops_when_shutdown_requested() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(&temp);
        let shutdown = ShutdownSignal::default();
        shutdown.request();

        let (_tx, rx) = mpsc::channel();
        let out = run(&mut engine, &TimerConfig::default(), None, &shutdown, &rx).unwrap();
        assert_eq!(out, "Stopped after 0 ticks");
        assert!(engine.storage().items_file().exists());
    }

    #[test]
    fn test_run_applies_queued_input_between_ticks() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(&temp);
        add(&mut engine, "Clock", None).unwrap();
        let config = TimerConfig {
            tick_interval_ms: 1,
            ..TimerConfig::default()
        };
        let (tx, rx) = mpsc::channel();
        tx.send("t Clock".to_string()).unwrap();
        tx.send("bogus".to_string()).unwrap();

        run(&mut engine, &config, Some(2), &ShutdownSignal::default(), &rx).unwrap();

        let reopened = TimerEngine::open(engine.storage().clone(), TimerConfig::default());
        let id = resolve_item(&reopened, "Clock").unwrap();
        let clock = reopened.item(&id).unwrap();
        assert!(clock.is_active);
        assert_eq!(clock.total_seconds, 2);
    }

    #[test]
    fn test_one_shot_edits_refused_while_run_holds_lock() {
        let temp = TempDir::new().unwrap();
        let mut runner = engine(&temp);
        add(&mut runner, "Build", None).unwrap();
        let lock = RunLock::acquire(runner.storage()).unwrap();

        let mut other = engine(&temp);
        assert!(matches!(
            toggle(&mut other, "Build"),
            Err(CliError::Timer(TimerError::RunActive { .. }))
        ));
        assert!(matches!(
            add_group(&mut other, "Work"),
            Err(CliError::Timer(TimerError::RunActive { .. }))
        ));
        assert!(list(&mut other, None, false).is_ok());

        for _ in 0..30 {
            runner.on_tick();
        }
        runner.save_now().unwrap();
        drop(lock);

        let mut after = engine(&temp);
        let id = resolve_item(&after, "Build").unwrap();
        assert!(!after.item(&id).unwrap().is_active);
        assert!(toggle(&mut after, "Build").is_ok());
    }

    #[test]
    fn test_removing_occupied_default_group_is_an_error() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(&temp);
        add_group(&mut engine, "Other").unwrap();
        add(&mut engine, "Kept", Some(DEFAULT_GROUP_ID)).unwrap();

        assert!(matches!(
            remove_group(&mut engine, DEFAULT_GROUP_ID),
            Err(CliError::DefaultGroupKept)
        ));
        assert!(engine.group(DEFAULT_GROUP_ID).is_some());
    }
}
