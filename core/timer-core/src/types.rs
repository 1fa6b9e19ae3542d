//! Entity model: counters ("items"), groups, and the shared on/off capability.
//!
//! Field names are the on-disk names; keep them stable.

use serde::{Deserialize, Serialize};

/// Id of the always-present fallback group.
pub const DEFAULT_GROUP_ID: &str = "0";
pub const DEFAULT_GROUP_NAME: &str = "Default";
pub const NEW_ITEM_NAME: &str = "New Stopwatch";
pub const NEW_GROUP_NAME: &str = "New Group";

fn new_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Something that can be switched on and off.
///
/// `set_active` reports whether anything changed so a binding layer can skip
/// notifications for repeated identical calls.
pub trait Activatable {
    fn is_active(&self) -> bool;

    fn set_active(&mut self, active: bool) -> bool;

    fn toggle(&mut self) -> bool {
        let next = !self.is_active();
        self.set_active(next)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Item
// ═══════════════════════════════════════════════════════════════════════════════

/// A single stopwatch counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default = "default_group_id")]
    pub group_id: String,
    #[serde(default)]
    pub elapsed_seconds: u64,
    #[serde(default)]
    pub total_seconds: u64,
    #[serde(default)]
    pub reset_count: u64,
    #[serde(default)]
    pub average_reset_seconds: u64,
    #[serde(default)]
    pub is_active: bool,
}

fn default_group_id() -> String {
    DEFAULT_GROUP_ID.to_string()
}

impl Item {
    pub fn new(name: &str, group_id: &str) -> Self {
        Self {
            id: new_id(),
            name: sanitize_name(name, NEW_ITEM_NAME),
            group_id: group_id.to_string(),
            elapsed_seconds: 0,
            total_seconds: 0,
            reset_count: 0,
            average_reset_seconds: 0,
            is_active: false,
        }
    }

    /// One second of running time.
    pub fn advance(&mut self) {
        self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
        self.total_seconds = self.total_seconds.saturating_add(1);
    }

    /// Zeroes the lap and folds it into the running average.
    pub fn apply_reset(&mut self) {
        self.elapsed_seconds = 0;
        self.reset_count = self.reset_count.saturating_add(1);
        self.recompute_average();
    }

    pub fn recompute_average(&mut self) {
        self.average_reset_seconds = if self.reset_count > 0 {
            self.total_seconds / self.reset_count
        } else {
            0
        };
    }

    pub fn rename(&mut self, name: &str) -> bool {
        let name = sanitize_name(name, NEW_ITEM_NAME);
        if self.name == name {
            return false;
        }
        self.name = name;
        true
    }
}

impl Activatable for Item {
    fn is_active(&self) -> bool {
        self.is_active
    }

    fn set_active(&mut self, active: bool) -> bool {
        if self.is_active == active {
            return false;
        }
        self.is_active = active;
        true
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Group
// ═══════════════════════════════════════════════════════════════════════════════

/// A named bucket of items. Exactly one group is selected at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub is_selected_exclusive: bool,
}

impl Group {
    pub fn new(display_name: &str) -> Self {
        Self {
            id: new_id(),
            display_name: sanitize_name(display_name, NEW_GROUP_NAME),
            is_selected_exclusive: false,
        }
    }

    pub fn default_group() -> Self {
        Self {
            id: DEFAULT_GROUP_ID.to_string(),
            display_name: DEFAULT_GROUP_NAME.to_string(),
            is_selected_exclusive: false,
        }
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_GROUP_ID
    }

    pub fn rename(&mut self, display_name: &str) -> bool {
        let name = sanitize_name(display_name, NEW_GROUP_NAME);
        if self.display_name == name {
            return false;
        }
        self.display_name = name;
        true
    }
}

impl Activatable for Group {
    fn is_active(&self) -> bool {
        self.is_selected_exclusive
    }

    fn set_active(&mut self, active: bool) -> bool {
        if self.is_selected_exclusive == active {
            return false;
        }
        self.is_selected_exclusive = active;
        true
    }
}

/// Strips line breaks and surrounding whitespace; blank names get `fallback`.
fn sanitize_name(name: &str, fallback: &str) -> String {
    let cleaned = name.replace(['\n', '\r'], " ");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned.to_string()
    }
}
