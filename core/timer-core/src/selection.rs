//! Group selection state machine.
//!
//! Exactly one group carries `is_selected_exclusive` once the set has been
//! initialized. Every transition here keeps that true; callers never flip the
//! flag on a group directly.

use crate::error::{Result, TimerError};
use crate::types::{Activatable, Group, Item, DEFAULT_GROUP_ID};

/// Adds the default group when the set is empty.
pub fn ensure_default_group(groups: &mut Vec<Group>) -> bool {
    if groups.is_empty() {
        groups.push(Group::default_group());
        return true;
    }
    false
}

/// Startup state: default group guaranteed, first group selected.
pub fn initialize_selection(groups: &mut Vec<Group>) {
    ensure_default_group(groups);
    for group in groups.iter_mut() {
        group.set_active(false);
    }
    if let Some(first) = groups.first_mut() {
        first.set_active(true);
    }
}

pub fn selected_group(groups: &[Group]) -> Option<&Group> {
    groups.iter().find(|g| g.is_selected_exclusive)
}

/// Deselects every group, then selects `group_id`.
///
/// Fails without touching anything if `group_id` is unknown.
pub fn select_group(groups: &mut [Group], group_id: &str) -> Result<()> {
    if !groups.iter().any(|g| g.id == group_id) {
        return Err(TimerError::GroupNotFound(group_id.to_string()));
    }
    for group in groups.iter_mut() {
        group.set_active(group.id == group_id);
    }
    Ok(())
}

/// Removes a group and moves its members to the default group.
///
/// If the group is selected, selection moves to the first remaining group
/// before removal; if nothing would remain, the default group is created and
/// selected. The default group itself is refused while it holds items or is
/// the only group, since it would come straight back. Returns how many items
/// were reassigned.
pub fn remove_group(groups: &mut Vec<Group>, items: &mut [Item], group_id: &str) -> Result<usize> {
    let index = groups
        .iter()
        .position(|g| g.id == group_id)
        .ok_or_else(|| TimerError::GroupNotFound(group_id.to_string()))?;

    if groups[index].is_default() {
        if items.iter().any(|i| i.group_id == group_id) {
            return Err(TimerError::DefaultGroupRequired(
                "it still holds stopwatches".to_string(),
            ));
        }
        if groups.len() == 1 {
            return Err(TimerError::DefaultGroupRequired(
                "it is the only group".to_string(),
            ));
        }
    }

    if groups[index].is_selected_exclusive {
        let fallback = groups
            .iter()
            .find(|g| g.id != group_id)
            .map(|g| g.id.clone());
        match fallback {
            Some(next) => select_group(groups, &next)?,
            None => {
                groups.push(Group::default_group());
                select_group(groups, DEFAULT_GROUP_ID)?;
            }
        }
    }

    groups.remove(index);
    let moved = reassign_members(items, group_id);
    if moved > 0 && !groups.iter().any(Group::is_default) {
        groups.push(Group::default_group());
    }
    Ok(moved)
}

fn reassign_members(items: &mut [Item], group_id: &str) -> usize {
    let mut moved = 0;
    for item in items.iter_mut().filter(|i| i.group_id == group_id) {
        item.group_id = DEFAULT_GROUP_ID.to_string();
        moved += 1;
    }
    moved
}

/// Items belonging to `group_id`, in collection order.
pub fn visible_items<'a>(items: &'a [Item], group_id: &str) -> Vec<&'a Item> {
    items.iter().filter(|i| i.group_id == group_id).collect()
}

/// Points items with an unknown `group_id` at the default group.
///
/// Also recreates the default group if repaired items would otherwise have no
/// group to show up in. Returns the number of repaired items.
pub fn repair_group_refs(items: &mut [Item], groups: &mut Vec<Group>) -> usize {
    let mut repaired = 0;
    for item in items.iter_mut() {
        let known = groups.iter().any(|g| g.id == item.group_id);
        if !known && item.group_id != DEFAULT_GROUP_ID {
            item.group_id = DEFAULT_GROUP_ID.to_string();
            repaired += 1;
        }
    }
    let orphaned = items.iter().any(|i| i.group_id == DEFAULT_GROUP_ID);
    if orphaned && !groups.iter().any(Group::is_default) {
        groups.push(Group::default_group());
    }
    repaired
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected_count(groups: &[Group]) -> usize {
        groups.iter().filter(|g| g.is_selected_exclusive).count()
    }

    fn three_groups() -> Vec<Group> {
        let mut groups = vec![Group::default_group(), Group::new("Work"), Group::new("Home")];
        initialize_selection(&mut groups);
        groups
    }

    #[test]
    fn test_initialize_empty_creates_default() {
        let mut groups = Vec::new();
        initialize_selection(&mut groups);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, DEFAULT_GROUP_ID);
        assert_eq!(groups[0].display_name, "Default");
        assert!(groups[0].is_selected_exclusive);
    }

    #[test]
    fn test_initialize_selects_first_and_clears_others() {
        let mut groups = vec![Group::new("A"), Group::new("B")];
        groups[1].is_selected_exclusive = true;
        initialize_selection(&mut groups);
        assert!(groups[0].is_selected_exclusive);
        assert!(!groups[1].is_selected_exclusive);
    }

    #[test]
    fn test_select_group_is_exclusive() {
        let mut groups = three_groups();
        let work = groups[1].id.clone();
        select_group(&mut groups, &work).unwrap();
        assert_eq!(selected_group(&groups).unwrap().id, work);
        assert_eq!(selected_count(&groups), 1);
    }

    #[test]
    fn test_select_unknown_group_leaves_state() {
        let mut groups = three_groups();
        let err = select_group(&mut groups, "missing").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(selected_group(&groups).unwrap().id, DEFAULT_GROUP_ID);
    }

    #[test]
    fn test_remove_selected_falls_back_to_first_remaining() {
        let mut groups = three_groups();
        let work = groups[1].id.clone();
        let home = groups[2].id.clone();
        select_group(&mut groups, &home).unwrap();

        remove_group(&mut groups, &mut [], &home).unwrap();
        assert_eq!(selected_group(&groups).unwrap().id, DEFAULT_GROUP_ID);
        assert_eq!(selected_count(&groups), 1);

        select_group(&mut groups, &work).unwrap();
        remove_group(&mut groups, &mut [], &work).unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_selected_exclusive);
    }

    #[test]
    fn test_remove_selected_first_group_picks_next() {
        let mut groups = three_groups();
        let work = groups[1].id.clone();
        remove_group(&mut groups, &mut [], DEFAULT_GROUP_ID).unwrap();
        assert_eq!(selected_group(&groups).unwrap().id, work);
    }

    #[test]
    fn test_remove_unselected_keeps_selection() {
        let mut groups = three_groups();
        let home = groups[2].id.clone();
        remove_group(&mut groups, &mut [], &home).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(selected_group(&groups).unwrap().id, DEFAULT_GROUP_ID);
    }

    #[test]
    fn test_remove_last_group_recreates_default() {
        let mut groups = vec![Group::new("Only")];
        initialize_selection(&mut groups);
        let only = groups[0].id.clone();

        remove_group(&mut groups, &mut [], &only).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, DEFAULT_GROUP_ID);
        assert!(groups[0].is_selected_exclusive);
    }

    #[test]
    fn test_remove_default_group_with_members_is_refused() {
        let mut groups = vec![Group::default_group(), Group::new("Work")];
        initialize_selection(&mut groups);
        let mut items = vec![Item::new("a", DEFAULT_GROUP_ID)];

        let err = remove_group(&mut groups, &mut items, DEFAULT_GROUP_ID).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].id, DEFAULT_GROUP_ID);
        assert!(groups[0].is_selected_exclusive);
        assert_eq!(items[0].group_id, DEFAULT_GROUP_ID);
    }

    #[test]
    fn test_remove_only_default_group_is_refused() {
        let mut groups = Vec::new();
        initialize_selection(&mut groups);

        assert!(remove_group(&mut groups, &mut [], DEFAULT_GROUP_ID).is_err());
        assert_eq!(groups.len(), 1);
        assert_eq!(selected_count(&groups), 1);
    }

    #[test]
    fn test_remove_empty_default_group_among_others() {
        let mut groups = three_groups();
        remove_group(&mut groups, &mut [], DEFAULT_GROUP_ID).unwrap();
        assert!(!groups.iter().any(Group::is_default));
        assert_eq!(selected_count(&groups), 1);
    }

    #[test]
    fn test_remove_group_reassigns_members() {
        let mut groups = three_groups();
        let work = groups[1].id.clone();
        let mut items = vec![
            Item::new("a", &work),
            Item::new("b", DEFAULT_GROUP_ID),
            Item::new("c", &work),
        ];

        let moved = remove_group(&mut groups, &mut items, &work).unwrap();
        assert_eq!(moved, 2);
        assert!(items.iter().all(|i| i.group_id == DEFAULT_GROUP_ID));
    }

    #[test]
    fn test_remove_group_restores_default_for_moved_items() {
        let mut groups = vec![Group::new("A"), Group::new("B")];
        initialize_selection(&mut groups);
        let b = groups[1].id.clone();
        let mut items = vec![Item::new("x", &b)];

        remove_group(&mut groups, &mut items, &b).unwrap();
        assert!(groups.iter().any(Group::is_default));
        assert_eq!(selected_count(&groups), 1);
        assert!(!groups.iter().find(|g| g.is_default()).unwrap().is_selected_exclusive);
    }

    #[test]
    fn test_remove_unknown_group_errors() {
        let mut groups = three_groups();
        assert!(remove_group(&mut groups, &mut [], "nope").is_err());
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn test_visible_items_filters_by_group() {
        let items = vec![
            Item::new("a", "g1"),
            Item::new("b", "g2"),
            Item::new("c", "g1"),
        ];
        let visible: Vec<_> = visible_items(&items, "g1")
            .into_iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(visible, vec!["a", "c"]);
    }

    #[test]
    fn test_repair_moves_dangling_items_to_default() {
        let mut groups = vec![Group::default_group(), Group::new("Kept")];
        let kept = groups[1].id.clone();
        let mut items = vec![Item::new("a", "gone"), Item::new("b", &kept)];

        let repaired = repair_group_refs(&mut items, &mut groups);
        assert_eq!(repaired, 1);
        assert_eq!(items[0].group_id, DEFAULT_GROUP_ID);
        assert_eq!(items[1].group_id, kept);
    }

    #[test]
    fn test_repair_recreates_missing_default_group() {
        let mut groups = vec![Group::new("Other")];
        let mut items = vec![Item::new("a", "gone")];
        repair_group_refs(&mut items, &mut groups);
        assert!(groups.iter().any(Group::is_default));
    }

    #[test]
    fn test_single_selection_over_mixed_operations() {
        let mut groups = three_groups();
        let mut items = Vec::new();
        for step in 0..12 {
            match step % 3 {
                0 => groups.push(Group::new("extra")),
                1 => {
                    let target = groups[groups.len() - 1].id.clone();
                    select_group(&mut groups, &target).unwrap();
                }
                _ => {
                    let target = groups[0].id.clone();
                    remove_group(&mut groups, &mut items, &target).unwrap();
                }
            }
            assert!(!groups.is_empty());
            assert_eq!(selected_count(&groups), 1);
        }
    }
}
