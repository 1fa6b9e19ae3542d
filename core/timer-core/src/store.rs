//! File-backed persistence for items and groups.
//!
//! Two independent stores live under the storage root:
//!
//! ```json
//! // items.json
//! { "version": 1, "saved_at": "2026-01-01T00:00:00Z", "items": [ { ...Item } ] }
//! // groups.json
//! { "version": 1, "saved_at": "2026-01-01T00:00:00Z", "groups": [ { ...Group } ] }
//! ```
//!
//! # Loading rules
//!
//! - Either file missing: both collections load empty.
//! - Unreadable file (I/O): [`TimerError::Persistence`].
//! - Empty, corrupt, or wrong-version file: that resource alone loads empty and
//!   a warning is recorded; the other resource is unaffected.
//!
//! # Atomic Writes
//!
//! Each file is written to a temp file in the same directory and renamed over
//! the target, so a crash mid-save leaves the previous file intact.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{Result, TimerError};
use crate::storage::StorageConfig;
use crate::types::{Group, Item};

/// Current on-disk schema version for both stores.
pub const STORE_VERSION: u32 = 1;

const ITEMS_RESOURCE: &str = "items";
const GROUPS_RESOURCE: &str = "groups";

#[derive(Debug, Serialize, Deserialize)]
struct ItemsFile {
    version: u32,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    items: Vec<Item>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroupsFile {
    version: u32,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    groups: Vec<Group>,
}

/// Collections read back from disk, plus any per-resource load failures.
#[derive(Debug, Default)]
pub struct LoadedState {
    pub items: Vec<Item>,
    pub groups: Vec<Group>,
    /// One [`TimerError::Load`] per resource that had to be discarded.
    pub warnings: Vec<TimerError>,
}

/// Reads and writes the two store files under a [`StorageConfig`] root.
#[derive(Debug, Clone)]
pub struct TimerStore {
    storage: StorageConfig,
}

impl TimerStore {
    pub fn new(storage: StorageConfig) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    pub fn save(&self, items: &[Item], groups: &[Group]) -> Result<()> {
        let root = self.storage.root();
        fs::create_dir_all(root)
            .map_err(|e| TimerError::io(format!("creating {}", root.display()), e))?;

        let saved_at = Some(Utc::now());
        let items_file = ItemsFile {
            version: STORE_VERSION,
            saved_at,
            items: items.to_vec(),
        };
        let groups_file = GroupsFile {
            version: STORE_VERSION,
            saved_at,
            groups: groups.to_vec(),
        };

        let items_json = serde_json::to_string_pretty(&items_file).map_err(|e| TimerError::Json {
            context: "serializing items".to_string(),
            source: e,
        })?;
        let groups_json =
            serde_json::to_string_pretty(&groups_file).map_err(|e| TimerError::Json {
                context: "serializing groups".to_string(),
                source: e,
            })?;

        atomic_write(&self.storage.items_file(), &items_json)?;
        atomic_write(&self.storage.groups_file(), &groups_json)?;

        debug!(
            items = items.len(),
            groups = groups.len(),
            "Saved timer state"
        );
        Ok(())
    }

    pub fn load(&self) -> Result<LoadedState> {
        let items_path = self.storage.items_file();
        let groups_path = self.storage.groups_file();

        if !items_path.exists() || !groups_path.exists() {
            debug!(
                items_present = items_path.exists(),
                groups_present = groups_path.exists(),
                "Store incomplete, starting empty"
            );
            return Ok(LoadedState::default());
        }

        let items_content = read_store(&items_path)?;
        let groups_content = read_store(&groups_path)?;

        let mut state = LoadedState::default();

        match decode_items(&items_content) {
            Ok(mut items) => {
                for item in items.iter_mut() {
                    item.recompute_average();
                }
                state.items = items;
            }
            Err(err) => {
                warn!(error = %err, path = %items_path.display(), "Discarding items store");
                state.warnings.push(err);
            }
        }

        match decode_groups(&groups_content) {
            Ok(groups) => state.groups = groups,
            Err(err) => {
                warn!(error = %err, path = %groups_path.display(), "Discarding groups store");
                state.warnings.push(err);
            }
        }

        Ok(state)
    }
}

fn read_store(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| TimerError::io(format!("reading {}", path.display()), e))
}

fn malformed(resource: &str, details: impl Into<String>) -> TimerError {
    TimerError::Load {
        resource: resource.to_string(),
        details: details.into(),
    }
}

fn check_version(resource: &str, version: u32) -> Result<()> {
    if version != STORE_VERSION {
        return Err(malformed(
            resource,
            format!(
                "unsupported version {} (expected {})",
                version, STORE_VERSION
            ),
        ));
    }
    Ok(())
}

fn decode_items(content: &str) -> Result<Vec<Item>> {
    if content.trim().is_empty() {
        return Err(malformed(ITEMS_RESOURCE, "file is empty"));
    }
    let file: ItemsFile =
        serde_json::from_str(content).map_err(|e| malformed(ITEMS_RESOURCE, e.to_string()))?;
    check_version(ITEMS_RESOURCE, file.version)?;
    Ok(file.items)
}

fn decode_groups(content: &str) -> Result<Vec<Group>> {
    if content.trim().is_empty() {
        return Err(malformed(GROUPS_RESOURCE, "file is empty"));
    }
    let file: GroupsFile =
        serde_json::from_str(content).map_err(|e| malformed(GROUPS_RESOURCE, e.to_string()))?;
    check_version(GROUPS_RESOURCE, file.version)?;
    Ok(file.groups)
}

/// Writes content to a file atomically using temp file + rename.
pub(crate) fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| TimerError::io(format!("creating temp file in {}", dir.display()), e))?;

    tmp.write_all(contents.as_bytes())
        .map_err(|e| TimerError::io(format!("writing temp file for {}", path.display()), e))?;

    tmp.flush()
        .map_err(|e| TimerError::io(format!("flushing temp file for {}", path.display()), e))?;

    tmp.persist(path)
        .map_err(|e| TimerError::io(format!("persisting {}", path.display()), e.error))?;

    Ok(())
}
