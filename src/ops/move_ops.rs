use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, warn};

use crate::model::content::{Content, ContentId, ScreenId};
use crate::model::state::{Completion, Intent, TreeState};
use crate::model::tree::{Bucket, MoveOption};
use crate::ops::recovery;
use crate::ops::tree_ops::{
    add_to_category_bucket, add_to_tree, remove_from_category_bucket, remove_from_tree,
};
use crate::remote::{MoveRequest, RemoteAuthority, RemoteError};
use crate::util::cancel::CancelHandle;

/// Error type for move operations
#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    #[error("content not found: {0}")]
    UnknownContent(ContentId),
    #[error("invalid move: {0}")]
    Precondition(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// A drag-and-drop gesture as reported by the list widget
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropGesture {
    /// The dragged content
    pub moved_id: ContentId,
    /// Content the drop landed nearest to
    #[serde(default)]
    pub nearest_id: Option<ContentId>,
    /// Drop landed on the lower half of `nearest_id`
    #[serde(default)]
    pub insert_after: bool,
    /// The widget flagged the drop as meaningless (e.g. onto itself)
    #[serde(default)]
    pub is_invalid_target: bool,
    /// First item of the list dropped into, when `nearest_id` is absent
    #[serde(default)]
    pub next_sibling_id: Option<ContentId>,
    /// Screen the list is showing; needed to address an empty unpinned list
    #[serde(default)]
    pub screen_id: Option<ScreenId>,
}

/// Phases of one move, as reported in debug logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePhase {
    Resolving,
    ComputingRequest,
    AwaitingRemote,
    Reconciling,
    Done,
    Failed,
}

/// Where a gesture resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum DropTarget {
    /// Next to an existing content
    Sibling { target: Content, insert_after: bool },
    /// Grouped content dropped on an empty group: becomes its last item
    IntoGroup(Content),
    /// A list with no drop anchor: the moved content's opposite
    /// pinned/unpinned partition. The content lands at its end.
    EmptyList(Bucket),
}

impl DropTarget {
    /// Id of the real content targeted, if any
    pub fn content_id(&self) -> Option<&str> {
        match self {
            DropTarget::Sibling { target, .. } | DropTarget::IntoGroup(target) => {
                Some(target.id.as_str())
            }
            DropTarget::EmptyList(_) => None,
        }
    }
}

/// The remote request for a move plus where to mirror it locally
#[derive(Debug, Clone, PartialEq)]
pub struct MovePlan {
    pub request: MoveRequest,
    pub option: MoveOption,
}

// ---------------------------------------------------------------------------
// Resolving
// ---------------------------------------------------------------------------

/// Resolve a gesture to a target. `None` aborts the move with no change.
pub fn resolve_target(
    state: &TreeState,
    gesture: &DropGesture,
    moved: &Content,
) -> Option<DropTarget> {
    let nearest = gesture.nearest_id.as_deref().and_then(|id| state.store.get(id));
    if let Some(nearest) = nearest {
        if moved.group_id.is_some() && nearest.is_root() && nearest.is_group() {
            // Dropped on a group header: go to the top of that group
            let first = state
                .tree
                .children(&nearest.id)
                .first()
                .and_then(|id| state.store.get(id));
            return Some(match first {
                Some(first) => DropTarget::Sibling {
                    target: first.clone(),
                    insert_after: false,
                },
                None => DropTarget::IntoGroup(nearest.clone()),
            });
        }
        return Some(DropTarget::Sibling {
            target: nearest.clone(),
            insert_after: gesture.insert_after,
        });
    }

    if gesture.is_invalid_target {
        return None;
    }

    let next = gesture.next_sibling_id.as_deref().and_then(|id| state.store.get(id));
    if let Some(next) = next {
        return Some(DropTarget::Sibling {
            target: next.clone(),
            insert_after: false,
        });
    }

    // Only the opposite partition can be an empty list the content was dropped in
    let screen_id = match &moved.screen_id {
        Some(_) => None,
        None => Some(gesture.screen_id.clone()?),
    };
    Some(DropTarget::EmptyList(Bucket {
        category: moved.category,
        screen_id,
    }))
}

// ---------------------------------------------------------------------------
// Computing the request
// ---------------------------------------------------------------------------

/// The request that would leave `moved` exactly where it is
pub fn current_position(state: &TreeState, moved: &Content) -> MoveRequest {
    let list = state.tree.container_of(moved);
    let next = list
        .iter()
        .position(|id| id == &moved.id)
        .and_then(|idx| list.get(idx + 1));
    match next {
        Some(next) => MoveRequest {
            screen_id: moved.screen_id.clone(),
            pos_content_id: Some(next.clone()),
            append_mode: false,
        },
        None => MoveRequest {
            screen_id: moved.screen_id.clone(),
            pos_content_id: moved.group_id.clone(),
            append_mode: true,
        },
    }
}

/// Translate a resolved target into the minimal remote request.
/// `Ok(None)` means the content is already there.
pub fn compute_plan(
    state: &TreeState,
    moved: &Content,
    target: &DropTarget,
) -> Result<Option<MovePlan>, MoveError> {
    let plan = match target {
        DropTarget::IntoGroup(group) => MovePlan {
            request: MoveRequest {
                screen_id: group.screen_id.clone(),
                pos_content_id: Some(group.id.clone()),
                append_mode: true,
            },
            option: MoveOption::Last,
        },
        DropTarget::EmptyList(bucket) => MovePlan {
            request: MoveRequest {
                screen_id: bucket.screen_id.clone(),
                pos_content_id: None,
                append_mode: true,
            },
            // The authority appends; the list may not really be empty
            option: MoveOption::Last,
        },
        DropTarget::Sibling {
            target,
            insert_after,
        } => {
            if moved.is_root() && target.group_id.is_some() {
                return Err(MoveError::Precondition(format!(
                    "root content {} cannot be moved into group {}",
                    moved.id,
                    target.group_id.as_deref().unwrap_or_default()
                )));
            }
            if moved.group_id.is_some() && target.is_root() && !target.is_group() {
                MovePlan {
                    request: MoveRequest {
                        screen_id: target.screen_id.clone(),
                        pos_content_id: Some(target.id.clone()),
                        append_mode: true,
                    },
                    option: MoveOption::Next(target.id.clone()),
                }
            } else {
                sibling_plan(state, target, *insert_after)
            }
        }
    };

    if plan.request.pos_content_id.as_deref() == Some(moved.id.as_str())
        || plan.request == current_position(state, moved)
    {
        return Ok(None);
    }
    Ok(Some(plan))
}

fn sibling_plan(state: &TreeState, target: &Content, insert_after: bool) -> MovePlan {
    let list = state.tree.container_of(target);
    let append_to_container = MovePlan {
        request: MoveRequest {
            screen_id: target.screen_id.clone(),
            pos_content_id: target.group_id.clone(),
            append_mode: true,
        },
        option: MoveOption::Last,
    };

    let Some(idx) = list.iter().position(|id| id == &target.id) else {
        warn!(target_id = %target.id, "drop target missing from its list, appending");
        return append_to_container;
    };
    if insert_after && idx + 1 == list.len() {
        return append_to_container;
    }

    let anchor = list.get(idx + usize::from(insert_after)).cloned();
    match anchor {
        Some(anchor) => MovePlan {
            request: MoveRequest {
                screen_id: target.screen_id.clone(),
                pos_content_id: Some(anchor.clone()),
                append_mode: false,
            },
            option: MoveOption::Previous(anchor),
        },
        None => append_to_container,
    }
}

// ---------------------------------------------------------------------------
// Full move
// ---------------------------------------------------------------------------

/// Run one gesture end to end: resolve, request, await, reconcile.
///
/// The move is keyed by the moved content's id in `cancel`; a cancel
/// arriving before the response is applied leaves local state untouched.
pub fn execute_move<R: RemoteAuthority + ?Sized>(
    state: &mut TreeState,
    remote: &mut R,
    cancel: &CancelHandle,
    gesture: &DropGesture,
) -> Result<Completion, MoveError> {
    let span = debug_span!("move", content_id = %gesture.moved_id);
    let _enter = span.enter();

    debug!(phase = ?MovePhase::Resolving);
    let moved = state
        .store
        .get(&gesture.moved_id)
        .cloned()
        .ok_or_else(|| MoveError::UnknownContent(gesture.moved_id.clone()))?;
    let Some(target) = resolve_target(state, gesture, &moved) else {
        debug!(phase = ?MovePhase::Done, "no valid drop target");
        return Ok(Completion::Unchanged);
    };

    debug!(phase = ?MovePhase::ComputingRequest, ?target);
    let plan = match compute_plan(state, &moved, &target) {
        Ok(Some(plan)) => plan,
        Ok(None) => {
            debug!(phase = ?MovePhase::Done, "already in place");
            return Ok(Completion::Unchanged);
        }
        Err(e) => {
            debug!(phase = ?MovePhase::Failed, error = %e);
            return Err(e);
        }
    };

    debug!(phase = ?MovePhase::AwaitingRemote, request = ?plan.request);
    cancel.begin(&moved.id);
    let response = remote.move_content(&moved.id, &plan.request);
    if cancel.take(&moved.id) {
        debug!("cancelled while awaiting the authority");
        return Ok(Completion::Cancelled);
    }
    let affected = match response {
        Ok(affected) => affected,
        Err(e) => {
            debug!(phase = ?MovePhase::Failed, error = %e);
            if e.is_not_found() {
                recover_from_missing(state, remote, &moved, &target);
            }
            return Err(e.into());
        }
    };

    debug!(phase = ?MovePhase::Reconciling, affected = affected.len());
    state.store.update_contents(&affected);
    let updated = state.store.get(&moved.id).cloned().unwrap_or_else(|| moved.clone());
    reconcile(state, &moved, &updated, &plan.option);

    debug!(phase = ?MovePhase::Done);
    Ok(Completion::Applied)
}

/// Mirror a confirmed move in the tree. `before` carries the old edges,
/// `after` the authoritative ones.
pub fn reconcile(state: &mut TreeState, before: &Content, after: &Content, option: &MoveOption) {
    let option = local_option(state, after, option);

    if before.is_root() && after.is_root() {
        if before.is_group() {
            // Children bookkeeping must survive a root reorder
            remove_from_category_bucket(&mut state.tree, before);
            add_to_category_bucket(&mut state.tree, after, &option);
            let source = Bucket::of(before);
            if source != Bucket::of(after) && !partition_has_group(state, &source) {
                state.emit(Intent::CreatePlaceholderGroup {
                    category: source.category,
                    screen_id: source.screen_id,
                });
            }
        } else {
            remove_from_tree(&mut state.tree, before);
            add_to_tree(&mut state.tree, after, &option);
        }
        return;
    }

    remove_from_tree(&mut state.tree, before);
    add_to_tree(&mut state.tree, after, &option);
    if let Some(group_id) = &after.group_id {
        state.expand_group(group_id);
    }
}

/// Keep the planned option when its anchor is in the destination list,
/// otherwise append.
fn local_option(state: &TreeState, after: &Content, option: &MoveOption) -> MoveOption {
    match option {
        MoveOption::Previous(anchor) | MoveOption::Next(anchor) => {
            let present = state
                .tree
                .container_of(after)
                .iter()
                .any(|id| id == anchor && id != &after.id);
            if present {
                option.clone()
            } else {
                debug!(anchor = %anchor, "anchor not in destination list, appending");
                MoveOption::Last
            }
        }
        MoveOption::First | MoveOption::Last => option.clone(),
    }
}

fn partition_has_group(state: &TreeState, bucket: &Bucket) -> bool {
    state
        .tree
        .root_list(bucket)
        .iter()
        .filter_map(|id| state.store.get(id))
        .any(Content::is_group)
}

/// The authority reported the moved content or its target missing: drop any
/// group that is gone, then the moved content itself.
fn recover_from_missing<R: RemoteAuthority + ?Sized>(
    state: &mut TreeState,
    remote: &mut R,
    moved: &Content,
    target: &DropTarget,
) {
    let ids = std::iter::once(moved.id.as_str()).chain(target.content_id());
    for id in ids.map(str::to_string).collect::<Vec<_>>() {
        if let Err(e) = recovery::check_and_remove_group(state, remote, &id) {
            warn!(content_id = %id, error = %e, "could not probe group during recovery");
        }
    }
    if let Some(stale) = state.store.remove(&moved.id) {
        remove_from_tree(&mut state.tree, &stale);
        if moved.is_group() {
            recovery::remove_group_children(state, &moved.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::content::{Category, ContentKind};
    use crate::ops::tree_build::rebuild;
    use crate::remote::MemoryAuthority;
    use pretty_assertions::assert_eq;

    fn layer(id: &str) -> Content {
        Content::new(id, Category::Overlay, ContentKind::Layer)
    }

    fn group(id: &str) -> Content {
        Content::new(id, Category::Overlay, ContentKind::Group)
    }

    fn state_of(contents: &[Content]) -> TreeState {
        let mut state = TreeState::default();
        state.store.replace_all(contents.to_vec());
        state.tree = rebuild(contents);
        state
    }

    fn drop_near(moved: &str, nearest: &str, insert_after: bool) -> DropGesture {
        DropGesture {
            moved_id: moved.into(),
            nearest_id: Some(nearest.into()),
            insert_after,
            ..Default::default()
        }
    }

    fn plan_for(state: &TreeState, gesture: &DropGesture) -> Result<Option<MovePlan>, MoveError> {
        let moved = state.store.get(&gesture.moved_id).unwrap();
        let target = resolve_target(state, gesture, moved).unwrap();
        compute_plan(state, moved, &target)
    }

    // --- resolve ---

    #[test]
    fn grouped_drop_on_group_header_targets_first_child() {
        let state = state_of(&[
            group("10"),
            layer("11").with_group("10"),
            group("20"),
            layer("21").with_group("20"),
        ]);
        let moved = state.store.get("11").unwrap();
        let target = resolve_target(&state, &drop_near("11", "20", true), moved).unwrap();
        assert_eq!(
            target,
            DropTarget::Sibling {
                target: layer("21").with_group("20"),
                insert_after: false
            }
        );
    }

    #[test]
    fn grouped_drop_on_empty_group_targets_group() {
        let state = state_of(&[group("10"), layer("11").with_group("10"), group("20")]);
        let moved = state.store.get("11").unwrap();
        let target = resolve_target(&state, &drop_near("11", "20", false), moved).unwrap();
        assert_eq!(target, DropTarget::IntoGroup(group("20")));
    }

    #[test]
    fn invalid_target_aborts() {
        let state = state_of(&[layer("1")]);
        let gesture = DropGesture {
            moved_id: "1".into(),
            is_invalid_target: true,
            ..Default::default()
        };
        assert_eq!(resolve_target(&state, &gesture, state.store.get("1").unwrap()), None);
    }

    #[test]
    fn empty_list_drop_targets_opposite_partition() {
        let state = state_of(&[layer("1").with_screen("s1")]);
        let gesture = DropGesture {
            moved_id: "1".into(),
            ..Default::default()
        };
        let target = resolve_target(&state, &gesture, state.store.get("1").unwrap()).unwrap();
        assert_eq!(target, DropTarget::EmptyList(Bucket::pinned(Category::Overlay)));
    }

    #[test]
    fn pinned_to_empty_unpinned_needs_screen() {
        let state = state_of(&[layer("1")]);
        let mut gesture = DropGesture {
            moved_id: "1".into(),
            ..Default::default()
        };
        assert_eq!(resolve_target(&state, &gesture, state.store.get("1").unwrap()), None);

        gesture.screen_id = Some("s1".into());
        let target = resolve_target(&state, &gesture, state.store.get("1").unwrap()).unwrap();
        assert_eq!(target, DropTarget::EmptyList(Bucket::unpinned(Category::Overlay, "s1")));
    }

    // --- request ---

    #[test]
    fn drop_after_predecessor_is_noop() {
        let state = state_of(&[layer("1"), layer("2"), layer("5"), layer("3")]);
        assert!(plan_for(&state, &drop_near("5", "2", true)).unwrap().is_none());
        assert!(plan_for(&state, &drop_near("5", "3", false)).unwrap().is_none());
    }

    #[test]
    fn drop_last_after_itself_is_noop() {
        let state = state_of(&[layer("1"), layer("2")]);
        assert!(plan_for(&state, &drop_near("2", "2", true)).unwrap().is_none());
    }

    #[test]
    fn drop_before_anchor() {
        let state = state_of(&[layer("1"), layer("2"), layer("3")]);
        let plan = plan_for(&state, &drop_near("3", "1", false)).unwrap().unwrap();
        assert_eq!(
            plan.request,
            MoveRequest {
                screen_id: None,
                pos_content_id: Some("1".into()),
                append_mode: false
            }
        );
        assert_eq!(plan.option, MoveOption::Previous("1".into()));
    }

    #[test]
    fn drop_after_last_appends_to_root_list() {
        let state = state_of(&[layer("1"), layer("2"), layer("3")]);
        let plan = plan_for(&state, &drop_near("1", "3", true)).unwrap().unwrap();
        assert_eq!(
            plan.request,
            MoveRequest {
                screen_id: None,
                pos_content_id: None,
                append_mode: true
            }
        );
    }

    #[test]
    fn drop_after_last_child_appends_to_group() {
        let state = state_of(&[
            group("10"),
            layer("11").with_group("10"),
            layer("12").with_group("10"),
        ]);
        let plan = plan_for(&state, &drop_near("11", "12", true)).unwrap().unwrap();
        assert_eq!(plan.request.pos_content_id.as_deref(), Some("10"));
        assert!(plan.request.append_mode);
        assert_eq!(plan.option, MoveOption::Last);
    }

    #[test]
    fn root_into_group_is_rejected() {
        let state = state_of(&[layer("1"), group("10"), layer("11").with_group("10")]);
        let err = plan_for(&state, &drop_near("1", "11", false)).unwrap_err();
        assert!(matches!(err, MoveError::Precondition(_)));
    }

    #[test]
    fn grouped_onto_root_content_appends_after_it() {
        let state = state_of(&[layer("1"), group("10"), layer("11").with_group("10")]);
        let plan = plan_for(&state, &drop_near("11", "1", false)).unwrap().unwrap();
        assert_eq!(plan.request.pos_content_id.as_deref(), Some("1"));
        assert!(plan.request.append_mode);
        assert_eq!(plan.option, MoveOption::Next("1".into()));
    }

    // --- execute ---

    fn run(
        contents: &[Content],
        gesture: DropGesture,
    ) -> (TreeState, MemoryAuthority, Result<Completion, MoveError>) {
        let mut state = state_of(contents);
        let mut remote = MemoryAuthority::new(contents.to_vec());
        let result = execute_move(&mut state, &mut remote, &CancelHandle::new(), &gesture);
        (state, remote, result)
    }

    /// The local tree must match a fresh rebuild of the authority's list
    fn assert_converged(state: &TreeState, remote: &MemoryAuthority) {
        assert_eq!(state.tree, rebuild(remote.contents()));
    }

    #[test]
    fn root_reorder_round_trip() {
        let contents = [layer("1"), layer("2"), layer("3")];
        let (state, remote, result) = run(&contents, drop_near("3", "1", false));
        assert_eq!(result.unwrap(), Completion::Applied);
        assert_eq!(state.tree.bucket(Category::Overlay).unwrap().pinned, vec!["3", "1", "2"]);
        assert_converged(&state, &remote);
    }

    #[test]
    fn move_out_of_group_round_trip() {
        let contents = [layer("1"), group("10"), layer("11").with_group("10"), layer("2")];
        let (state, remote, result) = run(&contents, drop_near("11", "1", true));
        assert_eq!(result.unwrap(), Completion::Applied);
        assert_eq!(state.store.get("11").unwrap().group_id, None);
        assert!(state.tree.children("10").is_empty());
        assert_converged(&state, &remote);
    }

    #[test]
    fn move_between_groups_expands_destination() {
        let contents = [
            group("10"),
            layer("11").with_group("10"),
            group("20"),
            layer("21").with_group("20"),
            layer("22").with_group("20"),
        ];
        let (mut state, remote, result) = run(&contents, drop_near("11", "21", true));
        assert_eq!(result.unwrap(), Completion::Applied);
        assert_eq!(
            state.tree.children("20"),
            &["21".to_string(), "11".to_string(), "22".to_string()]
        );
        assert_converged(&state, &remote);
        assert_eq!(
            state.drain_intents(),
            vec![Intent::ExpandGroup {
                group_id: "20".into()
            }]
        );
    }

    #[test]
    fn move_into_empty_group() {
        let contents = [group("10"), layer("11").with_group("10"), group("20")];
        let (state, remote, result) = run(&contents, drop_near("11", "20", false));
        assert_eq!(result.unwrap(), Completion::Applied);
        assert_eq!(state.tree.children("20"), &["11".to_string()]);
        assert!(state.tree.children("10").is_empty());
        assert_converged(&state, &remote);
    }

    #[test]
    fn group_reorder_keeps_children() {
        let contents = [group("10"), layer("11").with_group("10"), group("20")];
        let (state, remote, result) = run(&contents, drop_near("10", "20", true));
        assert_eq!(result.unwrap(), Completion::Applied);
        assert_eq!(state.tree.bucket(Category::Overlay).unwrap().pinned, vec!["20", "10"]);
        assert_eq!(state.tree.children("10"), &["11".to_string()]);
        assert_converged(&state, &remote);
    }

    #[test]
    fn last_group_leaving_partition_asks_for_placeholder() {
        let contents = [group("10"), layer("11").with_group("10"), layer("5").with_screen("s1")];
        let (mut state, remote, result) = run(&contents, drop_near("10", "5", false));
        assert_eq!(result.unwrap(), Completion::Applied);
        assert_eq!(state.store.get("11").unwrap().screen_id.as_deref(), Some("s1"));
        assert_converged(&state, &remote);
        assert_eq!(
            state.drain_intents(),
            vec![Intent::CreatePlaceholderGroup {
                category: Category::Overlay,
                screen_id: None
            }]
        );
    }

    #[test]
    fn empty_list_drop_onto_populated_partition_appends() {
        let contents = [layer("1"), layer("2").with_screen("s1"), layer("3").with_screen("s1")];
        let gesture = DropGesture {
            moved_id: "1".into(),
            screen_id: Some("s1".into()),
            ..Default::default()
        };
        let (state, remote, result) = run(&contents, gesture);
        assert_eq!(result.unwrap(), Completion::Applied);
        let bucket = state.tree.bucket(Category::Overlay).unwrap();
        assert_eq!(bucket.unpinned["s1"], vec!["2", "3", "1"]);
        assert!(bucket.pinned.is_empty());
        assert_converged(&state, &remote);
    }

    #[test]
    fn cancel_during_move_leaves_tree_untouched() {
        struct CancelOnMove<'a>(&'a mut MemoryAuthority, CancelHandle);
        impl RemoteAuthority for CancelOnMove<'_> {
            fn move_content(
                &mut self,
                id: &str,
                r: &MoveRequest,
            ) -> Result<Vec<Content>, RemoteError> {
                self.1.cancel(id);
                self.0.move_content(id, r)
            }
            fn create_content(
                &mut self,
                draft: crate::model::content::ContentDraft,
            ) -> Result<Content, RemoteError> {
                self.0.create_content(draft)
            }
            fn update_content(&mut self, c: &Content) -> Result<Content, RemoteError> {
                self.0.update_content(c)
            }
            fn probe_group(&mut self, id: &str) -> Result<Vec<Content>, RemoteError> {
                self.0.probe_group(id)
            }
            fn delete_content(&mut self, id: &str) -> Result<Vec<ContentId>, RemoteError> {
                self.0.delete_content(id)
            }
        }

        let contents = [layer("1"), layer("2"), layer("3")];
        let mut state = state_of(&contents);
        let mut remote = MemoryAuthority::new(contents.to_vec());
        let cancel = CancelHandle::new();
        let before = state.clone();

        let mut wrapped = CancelOnMove(&mut remote, cancel.clone());
        let result = execute_move(&mut state, &mut wrapped, &cancel, &drop_near("3", "1", false));
        assert_eq!(result.unwrap(), Completion::Cancelled);
        assert_eq!(state.tree, before.tree);
        assert_eq!(state.store.get("3"), before.store.get("3"));
        assert!(state.drain_intents().is_empty());
        assert!(!cancel.is_cancelled("3"));
    }

    #[test]
    fn noop_move_skips_remote() {
        let contents = [layer("1"), layer("2"), layer("5")];
        let mut state = state_of(&contents);
        let mut remote = MemoryAuthority::new(contents.to_vec());
        remote.inject_failure(RemoteError::Transient("must not be called".into()));
        let cancel = CancelHandle::new();
        let result = execute_move(&mut state, &mut remote, &cancel, &drop_near("5", "2", true));
        assert_eq!(result.unwrap(), Completion::Unchanged);
    }

    #[test]
    fn transient_failure_leaves_state_untouched() {
        let contents = [layer("1"), layer("2")];
        let mut state = state_of(&contents);
        let mut remote = MemoryAuthority::new(contents.to_vec());
        remote.inject_failure(RemoteError::Transient("offline".into()));
        let before = state.tree.clone();
        let cancel = CancelHandle::new();
        let err = execute_move(&mut state, &mut remote, &cancel, &drop_near("2", "1", false))
            .unwrap_err();
        assert!(matches!(err, MoveError::Remote(RemoteError::Transient(_))));
        assert_eq!(state.tree, before);
    }

    #[test]
    fn target_group_deleted_concurrently() {
        let contents = [
            group("10"),
            layer("11").with_group("10"),
            group("20"),
            layer("21").with_group("20"),
        ];
        let mut state = state_of(&contents);
        let mut remote = MemoryAuthority::new(contents.to_vec());
        remote.delete_behind_back("20");

        let cancel = CancelHandle::new();
        let err = execute_move(&mut state, &mut remote, &cancel, &drop_near("11", "21", false))
            .unwrap_err();
        assert!(matches!(err, MoveError::Remote(RemoteError::NotFound(_))));
        assert!(!state.store.contains("20"));
        assert!(!state.store.contains("21"));
        assert!(!state.store.contains("11"));
        assert!(!state.tree.ids_by_group.contains_key("20"));
        assert_eq!(state.tree.occurrences("11"), 0);
        assert_eq!(state.tree.children("10"), &[] as &[ContentId]);
    }
}
