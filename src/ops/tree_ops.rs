use tracing::{debug, warn};

use crate::model::content::{Content, ContentId};
use crate::model::tree::{MoveOption, Tree};

// ---------------------------------------------------------------------------
// Index computation
// ---------------------------------------------------------------------------

/// Resolve an insertion index in `list`. `None` when the anchor of
/// `Previous`/`Next` is not in the list.
pub fn index_for(list: &[ContentId], option: &MoveOption) -> Option<usize> {
    match option {
        MoveOption::First => Some(0),
        MoveOption::Last => Some(list.len()),
        MoveOption::Previous(target) => list.iter().position(|id| id == target),
        MoveOption::Next(target) => list.iter().position(|id| id == target).map(|i| i + 1),
    }
}

/// Insert `id` unless already present. Returns whether the list changed.
fn insert_once(list: &mut Vec<ContentId>, id: &str, option: &MoveOption) -> bool {
    if list.iter().any(|c| c == id) {
        return false;
    }
    match index_for(list, option) {
        Some(idx) => {
            list.insert(idx, id.to_string());
            true
        }
        None => {
            warn!(content_id = id, ?option, "insert anchor not found, content not inserted");
            false
        }
    }
}

/// Remove `id` from `list`. Returns whether it was present.
fn remove_once(list: &mut Vec<ContentId>, id: &str) -> bool {
    let before = list.len();
    list.retain(|c| c != id);
    list.len() != before
}

// ---------------------------------------------------------------------------
// Group bucket
// ---------------------------------------------------------------------------

/// Group-side bookkeeping of an insert: a root group gets its (empty)
/// children entry, a grouped content is inserted into its parent's children.
pub fn add_to_group_bucket(tree: &mut Tree, content: &Content, option: &MoveOption) {
    match &content.group_id {
        None => {
            if !content.is_group() {
                return;
            }
            if tree.ids_by_group.contains_key(&content.id) {
                warn!(group_id = %content.id, "group added twice, keeping existing children");
            } else {
                tree.ids_by_group.insert(content.id.clone(), Vec::new());
            }
        }
        Some(group_id) => {
            let children = tree.ids_by_group.entry(group_id.clone()).or_default();
            insert_once(children, &content.id, option);
        }
    }
}

/// Reverse of `add_to_group_bucket`. Removing a root group drops its
/// children bookkeeping only; the children themselves are the caller's.
pub fn remove_from_group_bucket(tree: &mut Tree, content: &Content) {
    match &content.group_id {
        None => {
            if content.is_group() {
                tree.ids_by_group.shift_remove(&content.id);
            }
        }
        Some(group_id) => {
            if let Some(children) = tree.ids_by_group.get_mut(group_id)
                && remove_once(children, &content.id)
            {
                return;
            }
            for (other_group, children) in tree.ids_by_group.iter_mut() {
                if remove_once(children, &content.id) {
                    warn!(
                        content_id = %content.id,
                        expected = %group_id,
                        found = %other_group,
                        "content was not in its recorded group"
                    );
                    return;
                }
            }
            debug!(content_id = %content.id, "content already absent from groups");
        }
    }
}

// ---------------------------------------------------------------------------
// Category bucket
// ---------------------------------------------------------------------------

/// Root-side bookkeeping of an insert; grouped contents are ignored.
pub fn add_to_category_bucket(tree: &mut Tree, content: &Content, option: &MoveOption) {
    if content.group_id.is_some() {
        return;
    }
    let list = tree
        .bucket_mut(content.category)
        .list_mut(content.screen_id.as_deref());
    insert_once(list, &content.id, option);
}

/// Reverse of `add_to_category_bucket`. Falls back to every root list of
/// every category when the expected list does not hold the id.
pub fn remove_from_category_bucket(tree: &mut Tree, content: &Content) {
    if content.group_id.is_some() {
        return;
    }
    if let Some(expected) = tree
        .bucket_mut(content.category)
        .existing_list_mut(content.screen_id.as_deref())
        && remove_once(expected, &content.id)
    {
        return;
    }
    for (category, bucket) in tree.root_ids_by_category.iter_mut() {
        for list in bucket.lists_mut() {
            if remove_once(list, &content.id) {
                warn!(
                    content_id = %content.id,
                    expected_category = %content.category,
                    found_category = %category,
                    "content was not in its expected root list"
                );
                return;
            }
        }
    }
    debug!(content_id = %content.id, "content already absent from root lists");
}

// ---------------------------------------------------------------------------
// Composed
// ---------------------------------------------------------------------------

/// Insert a content into the tree. Applying it twice is the same as once.
pub fn add_to_tree(tree: &mut Tree, content: &Content, option: &MoveOption) {
    add_to_group_bucket(tree, content, option);
    add_to_category_bucket(tree, content, option);
}

/// Remove a content from the tree. Missing ids are a no-op.
pub fn remove_from_tree(tree: &mut Tree, content: &Content) {
    remove_from_group_bucket(tree, content);
    remove_from_category_bucket(tree, content);
}
