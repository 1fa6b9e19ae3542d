//! Maps input events onto engine mutations.
//!
//! The key bindings mirror the widget: `n` new stopwatch, `r` reset hovered,
//! `delete` remove hovered item (or hovered group), `x` cut, `v` paste,
//! `g` new group. Keys are ignored while a text field has focus; that check
//! belongs to the UI layer.

use crate::engine::TimerEngine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NewItem,
    ResetHovered,
    DeleteHovered,
    CutHovered,
    PasteIntoSelected,
    NewGroup,
    ToggleItem(String),
    SelectGroup(String),
    Save,
}

impl Command {
    /// Looks up the command bound to a key name (case-insensitive).
    pub fn from_key(key: &str) -> Option<Command> {
        match key.to_ascii_lowercase().as_str() {
            "n" => Some(Command::NewItem),
            "r" => Some(Command::ResetHovered),
            "delete" | "del" => Some(Command::DeleteHovered),
            "x" => Some(Command::CutHovered),
            "v" => Some(Command::PasteIntoSelected),
            "g" => Some(Command::NewGroup),
            _ => None,
        }
    }
}

impl TimerEngine {
    /// Applies a command. Returns whether anything changed.
    pub fn dispatch(&mut self, command: Command) -> bool {
        match command {
            Command::NewItem => {
                self.add_item_to_selected();
                true
            }
            Command::ResetHovered => match self.hovered_item().map(|i| i.id.clone()) {
                Some(id) => self.reset_item(&id),
                None => false,
            },
            Command::DeleteHovered => {
                if let Some(id) = self.hovered_item().map(|i| i.id.clone()) {
                    self.remove_item(&id)
                } else if let Some(id) = self.hovered_group().map(|g| g.id.clone()) {
                    self.remove_group(&id)
                } else {
                    false
                }
            }
            Command::CutHovered => match self.hovered_item().map(|i| i.id.clone()) {
                Some(id) => self.cut_item(&id).is_some(),
                None => false,
            },
            Command::PasteIntoSelected => self.paste_into_selected().is_some(),
            Command::NewGroup => {
                self.add_default_named_group();
                true
            }
            Command::ToggleItem(id) => self.toggle_item_active(&id).is_some(),
            Command::SelectGroup(id) => self.select_group(&id),
            Command::Save => match self.save_now() {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(error = %err, "Save command failed");
                    false
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimerConfig;
    use crate::storage::StorageConfig;
    use crate::types::{DEFAULT_GROUP_ID, NEW_GROUP_NAME};
    use tempfile::TempDir;

    fn engine(temp: &TempDir) -> TimerEngine {
        TimerEngine::open(
            StorageConfig::with_root(temp.path().to_path_buf()),
            TimerConfig::default(),
        )
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(Command::from_key("n"), Some(Command::NewItem));
        assert_eq!(Command::from_key("R"), Some(Command::ResetHovered));
        assert_eq!(Command::from_key("Delete"), Some(Command::DeleteHovered));
        assert_eq!(Command::from_key("x"), Some(Command::CutHovered));
        assert_eq!(Command::from_key("v"), Some(Command::PasteIntoSelected));
        assert_eq!(Command::from_key("g"), Some(Command::NewGroup));
        assert_eq!(Command::from_key("q"), None);
    }

    #[test]
    fn test_new_item_and_group() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(&temp);
        assert!(engine.dispatch(Command::NewItem));
        assert!(engine.dispatch(Command::NewGroup));
        assert_eq!(engine.items()[0].group_id, DEFAULT_GROUP_ID);
        assert_eq!(engine.groups()[1].display_name, NEW_GROUP_NAME);
    }

    #[test]
    fn test_hover_commands_without_target_are_no_ops() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(&temp);
        assert!(!engine.dispatch(Command::ResetHovered));
        assert!(!engine.dispatch(Command::DeleteHovered));
        assert!(!engine.dispatch(Command::CutHovered));
        assert!(!engine.dispatch(Command::PasteIntoSelected));
    }

    #[test]
    fn test_delete_prefers_hovered_item_over_group() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(&temp);
        let group = engine.add_group("Side").id.clone();
        let item = engine.add_item("a", DEFAULT_GROUP_ID).id.clone();
        engine.hover_item(Some(&item));
        engine.hover_group(Some(&group));

        assert!(engine.dispatch(Command::DeleteHovered));
        assert!(engine.item(&item).is_none());
        assert!(engine.group(&group).is_some());

        assert!(engine.dispatch(Command::DeleteHovered));
        assert!(engine.group(&group).is_none());
    }

    #[test]
    fn test_cut_then_paste_into_selected_group() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(&temp);
        let target = engine.add_group("Target").id.clone();
        let item = engine.add_item("a", DEFAULT_GROUP_ID).id.clone();
        engine.hover_item(Some(&item));

        assert!(engine.dispatch(Command::CutHovered));
        assert!(engine.dispatch(Command::SelectGroup(target.clone())));
        assert!(engine.dispatch(Command::PasteIntoSelected));
        assert_eq!(engine.item(&item).unwrap().group_id, target);
    }

    #[test]
    fn test_toggle_and_reset_hovered() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(&temp);
        let item = engine.add_item("a", DEFAULT_GROUP_ID).id.clone();
        engine.hover_item(Some(&item));

        assert!(engine.dispatch(Command::ToggleItem(item.clone())));
        engine.on_tick();
        assert!(engine.dispatch(Command::ResetHovered));
        assert_eq!(engine.item(&item).unwrap().reset_count, 1);
    }

    #[test]
    fn test_save_command_writes_stores() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(&temp);
        assert!(engine.dispatch(Command::Save));
        assert!(engine.storage().items_file().exists());
    }
}
