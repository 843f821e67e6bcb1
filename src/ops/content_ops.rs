use tracing::{debug, info, warn};

use crate::model::config::EngineConfig;
use crate::model::content::{Content, ContentDraft, ContentId, ContentKind};
use crate::model::state::{Completion, TreeState};
use crate::model::tree::{Bucket, MoveOption};
use crate::ops::recovery;
use crate::ops::tree_ops::{add_to_tree, remove_from_tree};
use crate::remote::{RemoteAuthority, RemoteError};
use crate::util::cancel::CancelHandle;

/// Error type for content create/update/delete
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("content not found: {0}")]
    UnknownContent(ContentId),
    #[error("{0}")]
    Precondition(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// What a save writes: a new content, or new fields for an existing one
#[derive(Debug, Clone, PartialEq)]
pub enum ContentEdit {
    Create(ContentDraft),
    Update(Content),
}

/// Create or update a content and reflect the result locally.
///
/// When the target group turns out to be deleted, the group is cascaded away
/// and the content lands in the bucket's temporary group instead.
pub fn save_content<R: RemoteAuthority + ?Sized>(
    state: &mut TreeState,
    remote: &mut R,
    config: &EngineConfig,
    cancel: &CancelHandle,
    edit: ContentEdit,
) -> Result<Completion, ContentError> {
    check_edges(state, &edit)?;

    let key = match &edit {
        ContentEdit::Create(draft) => format!(
            "new:{}",
            Bucket {
                category: draft.category,
                screen_id: draft.screen_id.clone(),
            }
        ),
        ContentEdit::Update(content) => content.id.clone(),
    };
    cancel.begin(&key);
    let response = send(remote, &edit);
    let response = match response {
        Err(RemoteError::NotFound(missing)) => {
            retry_orphan(state, remote, config, edit, &missing)
        }
        other => other,
    };
    if cancel.take(&key) {
        debug!(key = %key, "save cancelled");
        if let Ok(saved) = &response
            && !state.store.contains(&saved.id)
        {
            discard_remote(remote, &saved.id);
        }
        return Ok(Completion::Cancelled);
    }

    apply_saved(state, config, response?);
    Ok(Completion::Applied)
}

fn send<R: RemoteAuthority + ?Sized>(
    remote: &mut R,
    edit: &ContentEdit,
) -> Result<Content, RemoteError> {
    match edit {
        ContentEdit::Create(draft) => remote.create_content(draft.clone()),
        ContentEdit::Update(content) => remote.update_content(content),
    }
}

/// Re-target an edit whose group vanished into the temporary group, then
/// send it again. An update whose content went with the group is recreated.
fn retry_orphan<R: RemoteAuthority + ?Sized>(
    state: &mut TreeState,
    remote: &mut R,
    config: &EngineConfig,
    edit: ContentEdit,
    missing: &str,
) -> Result<Content, RemoteError> {
    let group_id = match &edit {
        ContentEdit::Create(draft) => draft.group_id.clone(),
        ContentEdit::Update(content) => content.group_id.clone(),
    };
    let Some(group_id) = group_id else {
        return Err(RemoteError::NotFound(missing.to_string()));
    };
    if !recovery::remove_group_if_deleted(state, remote, &group_id)? {
        return Err(RemoteError::NotFound(missing.to_string()));
    }

    let (category, screen_id) = match &edit {
        ContentEdit::Create(draft) => (draft.category, draft.screen_id.clone()),
        ContentEdit::Update(content) => (content.category, content.screen_id.clone()),
    };
    let bucket = Bucket { category, screen_id };
    let temporary = recovery::find_or_create_temporary_group(state, remote, config, &bucket)?;
    info!(group_id = %group_id, temporary_id = %temporary.id, "re-targeting orphaned content");

    match edit {
        ContentEdit::Create(mut draft) => {
            draft.group_id = Some(temporary.id.clone());
            draft.screen_id = temporary.screen_id.clone();
            remote.create_content(draft)
        }
        ContentEdit::Update(mut content) => {
            content.group_id = Some(temporary.id.clone());
            content.screen_id = temporary.screen_id.clone();
            match remote.update_content(&content) {
                Err(RemoteError::NotFound(id)) if id == content.id => {
                    remote.create_content(ContentDraft::from(&content))
                }
                other => other,
            }
        }
    }
}

/// Depth and container checks that never need the authority
fn check_edges(state: &TreeState, edit: &ContentEdit) -> Result<(), ContentError> {
    let (is_group, group_id) = match edit {
        ContentEdit::Create(draft) => (draft.kind == ContentKind::Group, &draft.group_id),
        ContentEdit::Update(content) => {
            let Some(old) = state.store.get(&content.id) else {
                return Err(ContentError::UnknownContent(content.id.clone()));
            };
            if old.is_group()
                && (old.screen_id != content.screen_id
                    || old.category != content.category
                    || !content.is_group())
            {
                return Err(ContentError::Precondition(format!(
                    "group {} can only be relocated by a move",
                    content.id
                )));
            }
            (content.is_group(), &content.group_id)
        }
    };
    if is_group && group_id.is_some() {
        return Err(ContentError::Precondition("groups cannot be nested".into()));
    }
    if let Some(group_id) = group_id
        && let Some(parent) = state.store.get(group_id)
        && !parent.is_group()
    {
        return Err(ContentError::Precondition(format!("{} is not a group", group_id)));
    }
    Ok(())
}

/// Write a confirmed content into the store, moving it in the tree only when
/// its edges changed.
fn apply_saved(state: &mut TreeState, config: &EngineConfig, saved: Content) {
    match state.store.get(&saved.id).cloned() {
        Some(old)
            if old.group_id == saved.group_id
                && old.screen_id == saved.screen_id
                && old.category == saved.category =>
        {
            state.store.upsert(saved);
        }
        Some(old) => {
            remove_from_tree(&mut state.tree, &old);
            state.store.upsert(saved.clone());
            add_to_tree(&mut state.tree, &saved, &MoveOption::Last);
        }
        None => {
            let option = if saved.is_group() {
                config.groups.new_group_position.into()
            } else {
                MoveOption::Last
            };
            state.store.upsert(saved.clone());
            add_to_tree(&mut state.tree, &saved, &option);
            if saved.is_group() {
                state.ui.expanded.insert(saved.id.clone());
            }
        }
    }
}

/// Delete a content remotely and locally. A content the authority already
/// lost is still removed here.
pub fn delete_content<R: RemoteAuthority + ?Sized>(
    state: &mut TreeState,
    remote: &mut R,
    cancel: &CancelHandle,
    content_id: &str,
) -> Result<Completion, ContentError> {
    let content = state
        .store
        .get(content_id)
        .cloned()
        .ok_or_else(|| ContentError::UnknownContent(content_id.to_string()))?;

    cancel.begin(content_id);
    let response = remote.delete_content(content_id);
    if cancel.take(content_id) {
        return Ok(Completion::Cancelled);
    }
    match response {
        Ok(_) => {}
        Err(RemoteError::NotFound(_)) => {
            debug!(content_id, "already deleted remotely");
        }
        Err(e) => return Err(e.into()),
    }
    forget_content(state, &content);
    Ok(Completion::Applied)
}

/// Remove a content locally after the authority confirmed its deletion
pub fn forget_content(state: &mut TreeState, content: &Content) {
    if content.is_group() {
        recovery::remove_group(state, &content.id);
    } else {
        remove_from_tree(&mut state.tree, content);
        state.store.remove(&content.id);
        if state.ui.editing.as_deref() == Some(content.id.as_str()) {
            state.ui.editing = None;
        }
    }
}

/// Best-effort delete of a content this client created but will not keep
pub(crate) fn discard_remote<R: RemoteAuthority + ?Sized>(remote: &mut R, id: &str) {
    match remote.delete_content(id) {
        Ok(_) | Err(RemoteError::NotFound(_)) => {}
        Err(e) => warn!(content_id = id, error = %e, "could not delete discarded content"),
    }
}
