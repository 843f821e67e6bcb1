//! One user's view of a project's content tree, and the single entry point
//! through which every change to it flows.

use serde::Serialize;
use tracing::{debug, debug_span};

use crate::model::config::EngineConfig;
use crate::model::content::{Content, ContentId};
use crate::model::state::{Completion, Intent, TreeState, UiState};
use crate::model::tree::{Bucket, MoveOption};
use crate::ops::content_ops::{self, ContentEdit, ContentError};
use crate::ops::group_ops::{self, GroupError};
use crate::ops::move_ops::{self, DropGesture, MoveError};
use crate::ops::recovery;
use crate::ops::tree_build::rebuild;
use crate::ops::tree_ops::{add_to_tree, remove_from_tree};
use crate::remote::{RemoteAuthority, RemoteError};
use crate::util::cancel::CancelHandle;

/// Error type for session dispatch
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("content not found: {0}")]
    UnknownContent(ContentId),
    #[error(transparent)]
    Move(#[from] MoveError),
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl EngineError {
    /// The remote failure underneath, if any
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            EngineError::Remote(e)
            | EngineError::Move(MoveError::Remote(e))
            | EngineError::Group(GroupError::Remote(e))
            | EngineError::Content(ContentError::Remote(e)) => Some(e),
            _ => None,
        }
    }
}

/// Everything a caller can ask of a session
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace the canonical list and rebuild the tree from it
    Rebuild(Vec<Content>),
    /// Place a content locally, without consulting the authority
    Insert { content: Content, option: MoveOption },
    /// Drop a content locally, without consulting the authority
    Remove { content_id: ContentId },
    /// Apply a completed drag-and-drop gesture
    Move(DropGesture),
    CreateGroup {
        bucket: Bucket,
        title: Option<String>,
        start_rename: bool,
    },
    CopyGroup { group_id: ContentId, bucket: Bucket },
    SaveContent(ContentEdit),
    DeleteContent { content_id: ContentId },
    /// Probe the group owning a content and cascade if it is gone
    CheckGroup { content_id: ContentId },
    /// Cancel the operation running under `key`
    Cancel { key: String },
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Rebuild(_) => "rebuild",
            Action::Insert { .. } => "insert",
            Action::Remove { .. } => "remove",
            Action::Move(_) => "move",
            Action::CreateGroup { .. } => "create_group",
            Action::CopyGroup { .. } => "copy_group",
            Action::SaveContent(_) => "save_content",
            Action::DeleteContent { .. } => "delete_content",
            Action::CheckGroup { .. } => "check_group",
            Action::Cancel { .. } => "cancel",
        }
    }
}

/// Result of a dispatched action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub completion: Completion,
    pub intents: Vec<Intent>,
}

/// Owns the tree state, the authority and the cancellation marks.
pub struct Session<R: RemoteAuthority> {
    state: TreeState,
    config: EngineConfig,
    remote: R,
    cancel: CancelHandle,
}

impl<R: RemoteAuthority> Session<R> {
    pub fn new(remote: R, config: EngineConfig) -> Self {
        Session {
            state: TreeState::default(),
            config,
            remote,
            cancel: CancelHandle::new(),
        }
    }

    /// A session whose tree is built from `contents`
    pub fn with_contents(remote: R, config: EngineConfig, contents: Vec<Content>) -> Self {
        let mut session = Session::new(remote, config);
        session.replace_contents(contents);
        session
    }

    pub fn state(&self) -> &TreeState {
        &self.state
    }

    pub fn ui_mut(&mut self) -> &mut UiState {
        &mut self.state.ui
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn remote_mut(&mut self) -> &mut R {
        &mut self.remote
    }

    pub fn into_remote(self) -> R {
        self.remote
    }

    /// A handle sharing this session's cancellation marks
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Intents left behind by a failed dispatch
    pub fn take_intents(&mut self) -> Vec<Intent> {
        self.state.drain_intents()
    }

    pub fn dispatch(&mut self, action: Action) -> Result<Outcome, EngineError> {
        let span = debug_span!("dispatch", action = action.name());
        let _guard = span.enter();

        let completion = match action {
            Action::Rebuild(contents) => {
                self.replace_contents(contents);
                Completion::Applied
            }
            Action::Insert { content, option } => {
                self.state.store.upsert(content.clone());
                add_to_tree(&mut self.state.tree, &content, &option);
                Completion::Applied
            }
            Action::Remove { content_id } => {
                let content = self
                    .state
                    .store
                    .remove(&content_id)
                    .ok_or(EngineError::UnknownContent(content_id))?;
                remove_from_tree(&mut self.state.tree, &content);
                Completion::Applied
            }
            Action::Move(gesture) => {
                move_ops::execute_move(&mut self.state, &mut self.remote, &self.cancel, &gesture)?
            }
            Action::CreateGroup {
                bucket,
                title,
                start_rename,
            } => group_ops::create_group(
                &mut self.state,
                &mut self.remote,
                &self.config,
                &self.cancel,
                &bucket,
                title,
                start_rename,
            )?,
            Action::CopyGroup { group_id, bucket } => group_ops::copy_group(
                &mut self.state,
                &mut self.remote,
                &self.config,
                &self.cancel,
                &group_id,
                &bucket,
            )?,
            Action::SaveContent(edit) => {
                content_ops::save_content(
                    &mut self.state,
                    &mut self.remote,
                    &self.config,
                    &self.cancel,
                    edit,
                )?
            }
            Action::DeleteContent { content_id } => {
                content_ops::delete_content(
                    &mut self.state,
                    &mut self.remote,
                    &self.cancel,
                    &content_id,
                )?
            }
            Action::CheckGroup { content_id } => {
                let removed = recovery::check_and_remove_group(
                    &mut self.state,
                    &mut self.remote,
                    &content_id,
                )?;
                if removed {
                    Completion::Applied
                } else {
                    Completion::Unchanged
                }
            }
            Action::Cancel { key } => {
                self.cancel.cancel(&key);
                Completion::Unchanged
            }
        };

        debug!(?completion, "dispatch finished");
        Ok(Outcome {
            completion,
            intents: self.state.drain_intents(),
        })
    }

    fn replace_contents(&mut self, contents: Vec<Content>) {
        self.state.tree = rebuild(&contents);
        self.state.store.replace_all(contents);
        let store = &self.state.store;
        let ui = &mut self.state.ui;
        if ui.editing.as_ref().is_some_and(|id| !store.contains(id)) {
            ui.editing = None;
        }
        ui.expanded.retain(|id| store.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::content::{Category, ContentKind};
    use crate::remote::MemoryAuthority;
    use pretty_assertions::assert_eq;

    fn layer(id: &str) -> Content {
        Content::new(id, Category::Overlay, ContentKind::Layer)
    }

    fn group(id: &str) -> Content {
        Content::new(id, Category::Overlay, ContentKind::Group)
    }

    fn session(contents: Vec<Content>) -> Session<MemoryAuthority> {
        Session::with_contents(
            MemoryAuthority::new(contents.clone()),
            EngineConfig::default(),
            contents,
        )
    }

    #[test]
    fn rebuild_replaces_tree_and_prunes_ui() {
        let mut s = session(vec![layer("1"), group("10")]);
        s.ui_mut().editing = Some("1".into());
        s.ui_mut().expanded.insert("10".into());

        let outcome = s.dispatch(Action::Rebuild(vec![layer("2")])).unwrap();
        assert_eq!(outcome.completion, Completion::Applied);
        assert_eq!(s.state().tree.bucket(Category::Overlay).unwrap().pinned, vec!["2"]);
        assert_eq!(s.state().ui.editing, None);
        assert!(s.state().ui.expanded.is_empty());
    }

    #[test]
    fn local_insert_and_remove() {
        let mut s = session(vec![layer("1")]);
        s.dispatch(Action::Insert {
            content: layer("2"),
            option: MoveOption::First,
        })
        .unwrap();
        assert_eq!(s.state().tree.bucket(Category::Overlay).unwrap().pinned, vec!["2", "1"]);

        s.dispatch(Action::Remove { content_id: "1".into() }).unwrap();
        assert_eq!(s.state().tree.bucket(Category::Overlay).unwrap().pinned, vec!["2"]);

        let err = s.dispatch(Action::Remove { content_id: "1".into() }).unwrap_err();
        assert!(matches!(err, EngineError::UnknownContent(_)));
    }

    #[test]
    fn move_emits_intents_in_outcome() {
        let mut s = session(vec![
            group("10"),
            layer("11").with_group("10"),
            group("20"),
            layer("21").with_group("20"),
        ]);
        let outcome = s
            .dispatch(Action::Move(DropGesture {
                moved_id: "11".into(),
                nearest_id: Some("21".into()),
                ..DropGesture::default()
            }))
            .unwrap();
        assert_eq!(outcome.completion, Completion::Applied);
        assert_eq!(
            outcome.intents,
            vec![Intent::ExpandGroup {
                group_id: "20".into()
            }]
        );
        assert_eq!(s.state().tree.children("20").to_vec(), vec!["11", "21"]);
        assert!(s.state().tree.children("10").is_empty());
    }

    #[test]
    fn failed_dispatch_keeps_recovery_intents() {
        let mut s = session(vec![group("10"), layer("11").with_group("10"), layer("1")]);
        s.ui_mut().selected_groups.insert(Category::Overlay, "10".into());
        s.remote_mut().delete_behind_back("10");

        let err = s
            .dispatch(Action::Move(DropGesture {
                moved_id: "11".into(),
                nearest_id: Some("1".into()),
                ..DropGesture::default()
            }))
            .unwrap_err();
        assert_eq!(err.remote(), Some(&RemoteError::NotFound("11".into())));
        assert_eq!(
            s.take_intents(),
            vec![Intent::ClearSelection {
                category: Category::Overlay
            }]
        );
        assert_eq!(s.state().store.len(), 1);
    }

    #[test]
    fn check_group_reports_unchanged_for_live_group() {
        let mut s = session(vec![group("10"), layer("11").with_group("10")]);
        let outcome = s
            .dispatch(Action::CheckGroup {
                content_id: "11".into(),
            })
            .unwrap();
        assert_eq!(outcome.completion, Completion::Unchanged);
    }

    #[test]
    fn cancel_marks_shared_handle() {
        let mut s = session(vec![]);
        let handle = s.cancel_handle();
        s.dispatch(Action::Cancel { key: "7".into() }).unwrap();
        assert!(handle.is_cancelled("7"));
    }
}
