//! The request/response contract with the remote authority that owns the
//! canonical content list.

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::model::content::{Content, ContentDraft, ContentId, ScreenId};

pub use memory::MemoryAuthority;

/// Error type for remote calls
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The content or group no longer exists remotely
    #[error("not found: {0}")]
    NotFound(ContentId),
    /// Network or service failure; the request may be retried later
    #[error("transient failure: {0}")]
    Transient(String),
    /// The authority refused the request as malformed
    #[error("rejected: {0}")]
    Rejected(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

/// Positional update for one content.
///
/// `pos_content_id` anchors the placement; `append_mode` places at the end
/// of a group anchor, or right after a plain anchor. Without an anchor the
/// content goes to the end of the root list for `screen_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_id: Option<ScreenId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos_content_id: Option<ContentId>,
    pub append_mode: bool,
}

/// The remote authority. Calls are request/response; transport concerns
/// (retries, timeouts, auth) belong to the implementor.
pub trait RemoteAuthority {
    /// Move a content. Returns every content whose edges changed.
    fn move_content(
        &mut self,
        content_id: &str,
        request: &MoveRequest,
    ) -> Result<Vec<Content>, RemoteError>;

    /// Create a content. A draft targeting a missing group fails with
    /// `NotFound(group_id)`.
    fn create_content(&mut self, draft: ContentDraft) -> Result<Content, RemoteError>;

    /// Replace a content's fields, edges included.
    fn update_content(&mut self, content: &Content) -> Result<Content, RemoteError>;

    /// The group itself followed by its children; empty if it was deleted.
    fn probe_group(&mut self, group_id: &str) -> Result<Vec<Content>, RemoteError>;

    /// Delete a content; deleting a group deletes its children. Returns the
    /// ids removed.
    fn delete_content(&mut self, content_id: &str) -> Result<Vec<ContentId>, RemoteError>;
}
