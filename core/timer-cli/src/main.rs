//! timerthing: stopwatch groups that keep counting.
//!
//! ## Subcommands
//!
//! - `run`: tick once per interval, saving on cadence and on Ctrl-C; key
//!   commands arrive on stdin (see `input`). Holds `<root>/run.lock`, and
//!   the other edit commands refuse to run while it is held
//! - `list`, `summary`: read-only views of a group
//! - `add`, `remove`, `reset`, `toggle`, `rename`, `move`: item edits
//! - `group ...`: group edits
//!
//! Data lives in `~/.timerthing` unless `--home` or `TIMERTHING_HOME` says
//! otherwise.

mod commands;
mod error;
mod input;
mod logging;
mod signal;

use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use timer_core::{load_config, RunLock, StorageConfig, TimerEngine};

use error::CliError;
use signal::ShutdownSignal;

#[derive(Parser)]
#[command(name = "timerthing")]
#[command(about = "Stopwatch groups that keep counting")]
#[command(version)]
struct Cli {
    /// Data directory (defaults to $TIMERTHING_HOME, then ~/.timerthing)
    #[arg(long, global = true, value_name = "DIR")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tick running stopwatches until interrupted, reading key commands from stdin
    Run {
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
    },

    /// List stopwatches in a group (the first group by default)
    List {
        /// Group id or name
        #[arg(long)]
        group: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the summary line
    Summary {
        /// Item id or name (shows its total and average)
        #[arg(long)]
        item: Option<String>,

        /// Group id or name (shows its total)
        #[arg(long)]
        group: Option<String>,
    },

    /// Add a stopwatch
    Add {
        name: String,

        /// Group id or name
        #[arg(long)]
        group: Option<String>,
    },

    /// Remove a stopwatch
    Remove { item: String },

    /// Reset a stopwatch's current lap
    Reset { item: String },

    /// Start or stop a stopwatch
    Toggle { item: String },

    /// Rename a stopwatch
    Rename { item: String, name: String },

    /// Move a stopwatch to another group
    Move { item: String, group: String },

    /// Manage groups
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },
}

#[derive(Subcommand)]
enum GroupCommands {
    /// List groups
    List {
        #[arg(long)]
        json: bool,
    },

    /// Add a group
    Add { name: String },

    /// Remove a group; its stopwatches move to the default group
    Remove { group: String },

    /// Rename a group
    Rename { group: String, name: String },
}

fn storage_for(cli_home: Option<PathBuf>) -> StorageConfig {
    cli_home
        .or_else(|| env::var_os("TIMERTHING_HOME").map(PathBuf::from))
        .map(StorageConfig::with_root)
        .unwrap_or_default()
}

fn main() {
    let cli = Cli::parse();
    let storage = storage_for(cli.home);

    let _logging_guard = match cli.command {
        Commands::Run { .. } => logging::init_file(&storage),
        _ => {
            logging::init_stderr("warn");
            None
        }
    };

    match execute(cli.command, storage) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "timerthing command failed");
            eprintln!("timerthing: {}", e);
            std::process::exit(1);
        }
    }
}

fn execute(command: Commands, storage: StorageConfig) -> Result<String, CliError> {
    let config = load_config(&storage);
    // `run` owns the stores until it exits, so lock before reading them.
    let _run_lock = if matches!(command, Commands::Run { .. }) {
        Some(RunLock::acquire(&storage)?)
    } else {
        None
    };
    let mut engine = TimerEngine::open(storage, config.clone());
    if let Some(message) = engine.take_notification() {
        eprintln!("timerthing: {}", message);
    }

    match command {
        Commands::Run { ticks } => {
            let shutdown = ShutdownSignal::install()?;
            let input = input::spawn_stdin_reader();
            commands::run(&mut engine, &config, ticks, &shutdown, &input)
        }
        Commands::List { group, json } => commands::list(&mut engine, group.as_deref(), json),
        Commands::Summary { item, group } => {
            commands::summary(&mut engine, item.as_deref(), group.as_deref())
        }
        Commands::Add { name, group } => commands::add(&mut engine, &name, group.as_deref()),
        Commands::Remove { item } => commands::remove(&mut engine, &item),
        Commands::Reset { item } => commands::reset(&mut engine, &item),
        Commands::Toggle { item } => commands::toggle(&mut engine, &item),
        Commands::Rename { item, name } => commands::rename(&mut engine, &item, &name),
        Commands::Move { item, group } => commands::move_item(&mut engine, &item, &group),
        Commands::Group { command } => match command {
            GroupCommands::List { json } => commands::list_groups(&engine, json),
            GroupCommands::Add { name } => commands::add_group(&mut engine, &name),
            GroupCommands::Remove { group } => commands::remove_group(&mut engine, &group),
            GroupCommands::Rename { group, name } => {
                commands::rename_group(&mut engine, &group, &name)
            }
        },
    }
}
