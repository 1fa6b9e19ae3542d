//! TimerEngine - the single owner of all timer state.
//!
//! Every operation a UI layer needs goes through here: item and group
//! mutations, hover tracking, the cut/paste slot, ticking, and persistence.
//! The engine is synchronous and expects one caller at a time.
//!
//! Stale references coming from the UI (an id that no longer exists, a paste
//! with nothing cut) are logged and ignored; they never surface as errors.
//!
//! ```rust,ignore
//! use timer_core::{StorageConfig, TimerConfig, TimerEngine};
//!
//! let mut engine = TimerEngine::open(StorageConfig::default(), TimerConfig::default());
//! let id = engine.add_item_to_selected().id.clone();
//! engine.toggle_item_active(&id);
//! engine.on_tick();
//! println!("{}", engine.summary_display());
//! ```

use tracing::{debug, info, warn};

use crate::config::TimerConfig;
use crate::error::{Result, TimerError};
use crate::format::{group_summary, item_summary};
use crate::selection;
use crate::storage::StorageConfig;
use crate::store::{LoadedState, TimerStore};
use crate::tick::{TickEngine, TickOutcome};
use crate::types::{Activatable, Group, Item, DEFAULT_GROUP_ID, NEW_GROUP_NAME, NEW_ITEM_NAME};

/// Proof that an item is sitting in the cut slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemHandle {
    id: String,
}

impl ItemHandle {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Summary of a [`TimerEngine::load_now`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub items: usize,
    pub groups: usize,
    /// Items whose group no longer existed and were moved to the default group.
    pub repaired: usize,
    /// Messages for stores that were discarded as malformed.
    pub warnings: Vec<String>,
}

pub struct TimerEngine {
    items: Vec<Item>,
    groups: Vec<Group>,
    ticker: TickEngine,
    store: TimerStore,
    hovered_item: Option<String>,
    hovered_group: Option<String>,
    clipboard: Option<Item>,
    notification: Option<String>,
    /// Set when the stores exist but could not be read; saving would
    /// overwrite data this engine never saw.
    load_failure: Option<String>,
}

impl TimerEngine {
    /// Loads persisted state and initializes selection.
    ///
    /// A store that cannot be read leaves the engine empty (default group
    /// only) with a pending notification, and saving stays blocked until a
    /// later [`load_now`](Self::load_now) succeeds.
    pub fn open(storage: StorageConfig, config: TimerConfig) -> Self {
        let store = TimerStore::new(storage);
        let (loaded, failure) = match store.load() {
            Ok(loaded) => (loaded, None),
            Err(err) => {
                warn!(error = %err, "Failed to load timer state; starting empty, saving disabled");
                (LoadedState::default(), Some(err.to_string()))
            }
        };

        let mut engine = Self::build(store, &config);
        let report = engine.install(loaded);
        engine.notification = failure
            .as_ref()
            .map(|details| format!("Load failed, changes will not be saved: {}", details))
            .or_else(|| join_warnings(&report.warnings));
        engine.load_failure = failure;
        info!(
            items = report.items,
            groups = report.groups,
            repaired = report.repaired,
            "Timer state loaded"
        );
        engine
    }

    /// Builds an engine from explicit collections (repair + selection applied).
    pub fn with_state(
        storage: StorageConfig,
        config: TimerConfig,
        items: Vec<Item>,
        groups: Vec<Group>,
    ) -> Self {
        let store = TimerStore::new(storage);
        let mut engine = Self::build(store, &config);
        engine.install(LoadedState {
            items,
            groups,
            warnings: Vec::new(),
        });
        engine
    }

    fn build(store: TimerStore, config: &TimerConfig) -> Self {
        Self {
            items: Vec::new(),
            groups: Vec::new(),
            ticker: TickEngine::new(config.save_interval_ticks),
            store,
            hovered_item: None,
            hovered_group: None,
            clipboard: None,
            notification: None,
            load_failure: None,
        }
    }

    fn install(&mut self, loaded: LoadedState) -> LoadReport {
        let LoadedState {
            mut items,
            mut groups,
            warnings,
        } = loaded;
        let repaired = selection::repair_group_refs(&mut items, &mut groups);
        selection::initialize_selection(&mut groups);

        self.items = items;
        self.groups = groups;
        self.hovered_item = None;
        self.hovered_group = None;
        self.clipboard = None;

        LoadReport {
            items: self.items.len(),
            groups: self.groups.len(),
            repaired,
            warnings: warnings.iter().map(ToString::to_string).collect(),
        }
    }

    fn reject(&self, err: TimerError) {
        warn!(error = %err, "Ignoring stale reference");
    }

    /// Returns `group_id` if it exists, else the default group id (creating
    /// the default group when it has been removed).
    fn resolve_group(&mut self, group_id: &str) -> String {
        if self.groups.iter().any(|g| g.id == group_id) {
            return group_id.to_string();
        }
        if group_id != DEFAULT_GROUP_ID {
            self.reject(TimerError::GroupNotFound(group_id.to_string()));
        }
        if !self.groups.iter().any(Group::is_default) {
            self.groups.push(Group::default_group());
        }
        DEFAULT_GROUP_ID.to_string()
    }

    fn item_mut(&mut self, item_id: &str) -> Option<&mut Item> {
        let found = self.items.iter_mut().find(|i| i.id == item_id);
        if found.is_none() {
            warn!(item_id, "Ignoring stale item reference");
        }
        found
    }

    fn selected_id(&self) -> String {
        self.selected_group()
            .map_or_else(|| DEFAULT_GROUP_ID.to_string(), |g| g.id.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn group(&self, group_id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    pub fn selected_group(&self) -> Option<&Group> {
        selection::selected_group(&self.groups)
    }

    /// Items in the selected group, in collection order.
    pub fn visible_items(&self) -> Vec<&Item> {
        match self.selected_group() {
            Some(group) => selection::visible_items(&self.items, &group.id),
            None => Vec::new(),
        }
    }

    pub fn hovered_item(&self) -> Option<&Item> {
        self.hovered_item.as_deref().and_then(|id| self.item(id))
    }

    pub fn hovered_group(&self) -> Option<&Group> {
        self.hovered_group.as_deref().and_then(|id| self.group(id))
    }

    /// The item waiting to be pasted, if any.
    pub fn clipboard(&self) -> Option<&Item> {
        self.clipboard.as_ref()
    }

    pub fn ticks(&self) -> u64 {
        self.ticker.ticks()
    }

    pub fn storage(&self) -> &StorageConfig {
        self.store.storage()
    }

    /// Hovered item's total/average, otherwise the selected group's total.
    pub fn summary_display(&self) -> String {
        let Some(group) = self.selected_group() else {
            return String::new();
        };
        if let Some(item) = self.hovered_item() {
            return item_summary(item);
        }
        let total: u64 = selection::visible_items(&self.items, &group.id)
            .iter()
            .map(|i| i.elapsed_seconds)
            .sum();
        group_summary(total)
    }

    /// Takes the pending user-facing message (persistence failures).
    pub fn take_notification(&mut self) -> Option<String> {
        self.notification.take()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Items
    // ─────────────────────────────────────────────────────────────────────────────

    /// Adds an item to `group_id`; unknown groups fall back to the default group.
    pub fn add_item(&mut self, name: &str, group_id: &str) -> &Item {
        let group_id = self.resolve_group(group_id);
        let item = Item::new(name, &group_id);
        info!(item_id = %item.id, group_id = %group_id, "Item added");
        self.items.push(item);
        &self.items[self.items.len() - 1]
    }

    /// Adds a fresh "New Stopwatch" to the selected group.
    pub fn add_item_to_selected(&mut self) -> &Item {
        let group_id = self.selected_id();
        self.add_item(NEW_ITEM_NAME, &group_id)
    }

    pub fn remove_item(&mut self, item_id: &str) -> bool {
        let Some(index) = self.items.iter().position(|i| i.id == item_id) else {
            self.reject(TimerError::ItemNotFound(item_id.to_string()));
            return false;
        };
        self.items.remove(index);
        if self.hovered_item.as_deref() == Some(item_id) {
            self.hovered_item = None;
        }
        info!(item_id, "Item removed");
        true
    }

    /// Resets a running lap. Items with no elapsed time are left alone.
    pub fn reset_item(&mut self, item_id: &str) -> bool {
        let Some(item) = self.item_mut(item_id) else {
            return false;
        };
        if item.elapsed_seconds == 0 {
            return false;
        }
        item.apply_reset();
        debug!(
            item_id,
            reset_count = item.reset_count,
            average = item.average_reset_seconds,
            "Item reset"
        );
        true
    }

    pub fn rename_item(&mut self, item_id: &str, name: &str) -> bool {
        self.item_mut(item_id).is_some_and(|item| item.rename(name))
    }

    /// Flips running/stopped. Returns the new state.
    pub fn toggle_item_active(&mut self, item_id: &str) -> Option<bool> {
        let item = self.item_mut(item_id)?;
        item.toggle();
        Some(item.is_active)
    }

    /// Returns whether the state changed.
    pub fn set_item_active(&mut self, item_id: &str, active: bool) -> bool {
        self.item_mut(item_id)
            .is_some_and(|item| item.set_active(active))
    }

    /// Moves an item into the cut slot.
    ///
    /// An item already in the slot goes back to its former group first.
    pub fn cut_item(&mut self, item_id: &str) -> Option<ItemHandle> {
        let Some(index) = self.items.iter().position(|i| i.id == item_id) else {
            self.reject(TimerError::ItemNotFound(item_id.to_string()));
            return None;
        };

        if let Some(mut previous) = self.clipboard.take() {
            previous.group_id = self.resolve_group(&previous.group_id);
            debug!(item_id = %previous.id, "Restoring previously cut item");
            self.items.push(previous);
        }

        let item = self.items.remove(index);
        if self.hovered_item.as_deref() == Some(item_id) {
            self.hovered_item = None;
        }
        let handle = ItemHandle {
            id: item.id.clone(),
        };
        self.clipboard = Some(item);
        Some(handle)
    }

    /// Puts the cut item into `target_group_id` (default group if unknown).
    pub fn paste_item(&mut self, handle: &ItemHandle, target_group_id: &str) -> Option<&Item> {
        let matches = self.clipboard.as_ref().is_some_and(|i| i.id == handle.id);
        if !matches {
            self.reject(TimerError::ClipboardMismatch(handle.id.clone()));
            return None;
        }
        let group_id = self.resolve_group(target_group_id);
        let mut item = self.clipboard.take()?;
        item.group_id = group_id;
        self.items.push(item);
        self.items.last()
    }

    /// Pastes whatever is in the cut slot into the selected group.
    pub fn paste_into_selected(&mut self) -> Option<&Item> {
        let handle = ItemHandle {
            id: self.clipboard.as_ref()?.id.clone(),
        };
        let group_id = self.selected_id();
        self.paste_item(&handle, &group_id)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Groups
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn add_group(&mut self, display_name: &str) -> &Group {
        let group = Group::new(display_name);
        info!(group_id = %group.id, "Group added");
        self.groups.push(group);
        &self.groups[self.groups.len() - 1]
    }

    pub fn add_default_named_group(&mut self) -> &Group {
        self.add_group(NEW_GROUP_NAME)
    }

    pub fn rename_group(&mut self, group_id: &str, display_name: &str) -> bool {
        match self.groups.iter_mut().find(|g| g.id == group_id) {
            Some(group) => group.rename(display_name),
            None => {
                self.reject(TimerError::GroupNotFound(group_id.to_string()));
                false
            }
        }
    }

    /// Removes a group, moving selection first and members to the default group.
    ///
    /// Returns `false` for unknown ids and for the default group while it
    /// still holds items or is the only group.
    pub fn remove_group(&mut self, group_id: &str) -> bool {
        match selection::remove_group(&mut self.groups, &mut self.items, group_id) {
            Ok(moved) => {
                if self.hovered_group.as_deref() == Some(group_id) {
                    self.hovered_group = None;
                }
                info!(group_id, moved, "Group removed");
                true
            }
            Err(err @ TimerError::DefaultGroupRequired(_)) => {
                warn!(group_id, error = %err, "Group not removed");
                false
            }
            Err(err) => {
                self.reject(err);
                false
            }
        }
    }

    pub fn select_group(&mut self, group_id: &str) -> bool {
        match selection::select_group(&mut self.groups, group_id) {
            Ok(()) => {
                debug!(group_id, "Group selected");
                true
            }
            Err(err) => {
                self.reject(err);
                false
            }
        }
    }

    /// Selects `group_id` and clears every other group's flag.
    pub fn toggle_group_exclusive_select(&mut self, group_id: &str) -> bool {
        self.select_group(group_id)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Hover
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn hover_item(&mut self, item_id: Option<&str>) {
        self.hovered_item = item_id
            .filter(|id| self.items.iter().any(|i| i.id == *id))
            .map(str::to_string);
    }

    pub fn hover_group(&mut self, group_id: Option<&str>) {
        self.hovered_group = group_id
            .filter(|id| self.groups.iter().any(|g| g.id == *id))
            .map(str::to_string);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Ticking & Persistence
    // ─────────────────────────────────────────────────────────────────────────────

    /// One second of wall-clock time. Saves on the configured cadence.
    pub fn on_tick(&mut self) -> TickOutcome {
        let outcome = self.ticker.tick(&mut self.items);
        if outcome.save_due {
            if let Err(err) = self.save_now() {
                warn!(error = %err, "Periodic save failed; keeping in-memory state");
                self.notification = Some(format!("Save failed: {}", err));
            }
        }
        outcome
    }

    /// Writes both stores. A pending cut item is saved in its former group.
    ///
    /// Refused with [`TimerError::SaveBlocked`] while the stores on disk
    /// could not be read at open.
    pub fn save_now(&self) -> Result<()> {
        if let Some(details) = &self.load_failure {
            return Err(TimerError::SaveBlocked {
                details: details.clone(),
            });
        }
        match &self.clipboard {
            Some(cut) => {
                let mut items = self.items.clone();
                items.push(cut.clone());
                self.store.save(&items, &self.groups)
            }
            None => self.store.save(&self.items, &self.groups),
        }
    }

    /// Replaces in-memory state with what is on disk.
    ///
    /// On I/O failure the current state is kept and the error returned.
    pub fn load_now(&mut self) -> Result<LoadReport> {
        let loaded = self.store.load()?;
        let report = self.install(loaded);
        self.load_failure = None;
        if let Some(message) = join_warnings(&report.warnings) {
            self.notification = Some(message);
        }
        Ok(report)
    }
}

fn join_warnings(warnings: &[String]) -> Option<String> {
    if warnings.is_empty() {
        None
    } else {
        Some(warnings.join("; "))
    }
}
