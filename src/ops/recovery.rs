use tracing::{debug, info};

use crate::model::config::EngineConfig;
use crate::model::content::{Content, ContentDraft, ContentId};
use crate::model::state::{Intent, TreeState};
use crate::model::tree::Bucket;
use crate::ops::tree_ops::{add_to_tree, remove_from_tree};
use crate::remote::{RemoteAuthority, RemoteError};

/// The group a content belongs to: itself if it is a group, else its parent.
/// Ids only known to the tree (a group already gone from the store) resolve
/// to themselves.
pub fn owning_group_id(state: &TreeState, content_id: &str) -> Option<ContentId> {
    match state.store.get(content_id) {
        Some(content) if content.is_group() => Some(content.id.clone()),
        Some(content) => content.group_id.clone(),
        None if state.tree.ids_by_group.contains_key(content_id) => Some(content_id.to_string()),
        None => None,
    }
}

/// Probe the authority for the group owning `content_id` and, if it is gone,
/// cascade the deletion locally. Returns whether a group was removed.
pub fn check_and_remove_group<R: RemoteAuthority + ?Sized>(
    state: &mut TreeState,
    remote: &mut R,
    content_id: &str,
) -> Result<bool, RemoteError> {
    let Some(group_id) = owning_group_id(state, content_id) else {
        debug!(content_id, "content has no owning group, nothing to check");
        return Ok(false);
    };
    remove_group_if_deleted(state, remote, &group_id)
}

/// Probe `group_id` directly; cascade locally if the authority no longer has it.
pub fn remove_group_if_deleted<R: RemoteAuthority + ?Sized>(
    state: &mut TreeState,
    remote: &mut R,
    group_id: &str,
) -> Result<bool, RemoteError> {
    if !remote.probe_group(group_id)?.is_empty() {
        return Ok(false);
    }
    info!(group_id, "group was deleted remotely, removing it locally");
    remove_group(state, group_id);
    Ok(true)
}

/// Remove a group, its recorded children and every UI pointer to them.
/// Returns the removed contents, children first.
pub fn remove_group(state: &mut TreeState, group_id: &str) -> Vec<Content> {
    let mut removed = remove_group_children(state, group_id);

    match state.store.remove(group_id) {
        Some(group) => {
            remove_from_tree(&mut state.tree, &group);
            removed.push(group);
        }
        None => {
            // Only the tree knew about it
            state.tree.ids_by_group.shift_remove(group_id);
            for bucket in state.tree.root_ids_by_category.values_mut() {
                for list in bucket.lists_mut() {
                    list.retain(|id| id != group_id);
                }
            }
        }
    }

    let editing_removed = state
        .ui
        .editing
        .as_ref()
        .is_some_and(|id| id == group_id || removed.iter().any(|c| &c.id == id));
    if editing_removed {
        state.ui.editing = None;
    }

    let cleared: Vec<_> = state
        .ui
        .selected_groups
        .iter()
        .filter(|(_, selected)| selected.as_str() == group_id)
        .map(|(category, _)| *category)
        .collect();
    for category in cleared {
        state.ui.selected_groups.remove(&category);
        state.emit(Intent::ClearSelection { category });
    }
    state.ui.expanded.remove(group_id);

    removed
}

/// Remove every content the store records as a child of `group_id`, from
/// both store and tree. The group itself is left alone.
pub fn remove_group_children(state: &mut TreeState, group_id: &str) -> Vec<Content> {
    let children = state.store.children_of(group_id);
    for child in &children {
        remove_from_tree(&mut state.tree, child);
        state.store.remove(&child.id);
    }
    children
}

/// A root group in `bucket` titled with the localized temporary title,
/// created if none exists. Orphaned contents are re-targeted into it.
pub fn find_or_create_temporary_group<R: RemoteAuthority + ?Sized>(
    state: &mut TreeState,
    remote: &mut R,
    config: &EngineConfig,
    bucket: &Bucket,
) -> Result<Content, RemoteError> {
    let title = config.locale.temporary_group();
    let existing = state
        .store
        .iter()
        .find(|c| c.is_group() && c.is_root() && bucket.contains(c) && c.title == title)
        .cloned();
    if let Some(group) = existing {
        return Ok(group);
    }

    let group = remote.create_content(ContentDraft::group(
        bucket.category,
        bucket.screen_id.clone(),
        title,
    ))?;
    info!(group_id = %group.id, %bucket, "created temporary group for orphaned content");
    state.store.upsert(group.clone());
    add_to_tree(&mut state.tree, &group, &config.groups.new_group_position.into());
    Ok(group)
}
