use std::collections::VecDeque;

use crate::model::content::{Content, ContentDraft, ContentId};

use super::{MoveRequest, RemoteAuthority, RemoteError};

/// In-process authority holding the canonical flat list.
///
/// List order inside the tree is the relative order of contents in `contents`,
/// so every placement is expressed as a position in this one vector.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuthority {
    contents: Vec<Content>,
    next_id: u64,
    injected: VecDeque<RemoteError>,
}

impl MemoryAuthority {
    pub fn new(contents: Vec<Content>) -> Self {
        let next_id = contents
            .iter()
            .filter_map(|c| c.id.parse::<u64>().ok())
            .max()
            .map_or(1, |n| n + 1);
        MemoryAuthority {
            contents,
            next_id,
            injected: VecDeque::new(),
        }
    }

    /// The canonical list, in order
    pub fn contents(&self) -> &[Content] {
        &self.contents
    }

    pub fn get(&self, id: &str) -> Option<&Content> {
        self.contents.iter().find(|c| c.id == id)
    }

    /// Make the next call fail with `error`, regardless of its arguments.
    /// Queued errors are consumed in order, one per call.
    pub fn inject_failure(&mut self, error: RemoteError) {
        self.injected.push_back(error);
    }

    /// Delete a content the way another collaborator would, without going
    /// through this client.
    pub fn delete_behind_back(&mut self, id: &str) {
        let _ = self.remove_with_children(id);
    }

    fn take_injected(&mut self) -> Result<(), RemoteError> {
        match self.injected.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.contents.iter().position(|c| c.id == id)
    }

    fn existing_group(&self, id: &str) -> Result<&Content, RemoteError> {
        self.get(id)
            .filter(|c| c.is_group())
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }

    fn allocate_id(&mut self) -> ContentId {
        let id = self.next_id.to_string();
        self.next_id += 1;
        id
    }

    fn remove_with_children(&mut self, id: &str) -> Vec<ContentId> {
        let mut removed = Vec::new();
        self.contents.retain(|c| {
            if c.id == id || c.group_id.as_deref() == Some(id) {
                removed.push(c.id.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Index just past the last member of a list, `None` if the list is empty
    fn end_of_list(&self, in_list: impl Fn(&Content) -> bool) -> Option<usize> {
        self.contents.iter().rposition(in_list).map(|i| i + 1)
    }
}

impl RemoteAuthority for MemoryAuthority {
    fn move_content(
        &mut self,
        content_id: &str,
        request: &MoveRequest,
    ) -> Result<Vec<Content>, RemoteError> {
        self.take_injected()?;

        let moved = self
            .get(content_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(content_id.to_string()))?;

        if request.pos_content_id.as_deref() == Some(content_id) {
            return Ok(vec![moved]);
        }

        // Destination edges, and the id the moved content is placed before
        // (`Err(id)`) or after (`Ok(id)`); `None` appends to the vector.
        let (group_id, screen_id, anchor) = match &request.pos_content_id {
            Some(pos) => {
                let anchor = self
                    .get(pos)
                    .cloned()
                    .ok_or_else(|| RemoteError::NotFound(pos.clone()))?;
                if !request.append_mode {
                    (anchor.group_id.clone(), anchor.screen_id.clone(), Some(Err(anchor.id)))
                } else if anchor.is_group() {
                    let last = self
                        .contents
                        .iter()
                        .rev()
                        .find(|c| c.group_id.as_deref() == Some(anchor.id.as_str()))
                        .map_or_else(|| anchor.id.clone(), |c| c.id.clone());
                    (Some(anchor.id.clone()), anchor.screen_id.clone(), Some(Ok(last)))
                } else {
                    (anchor.group_id.clone(), anchor.screen_id.clone(), Some(Ok(anchor.id)))
                }
            }
            None => {
                let screen_id = request.screen_id.clone();
                let last = self
                    .end_of_list(|c| {
                        c.id != moved.id
                            && c.group_id.is_none()
                            && c.category == moved.category
                            && c.screen_id == screen_id
                    })
                    .map(|end| Ok(self.contents[end - 1].id.clone()));
                (None, screen_id, last)
            }
        };

        if moved.is_group() && group_id.is_some() {
            return Err(RemoteError::Rejected(format!(
                "group {} cannot be nested",
                moved.id
            )));
        }

        let from = self
            .position(&moved.id)
            .ok_or_else(|| RemoteError::NotFound(moved.id.clone()))?;
        let mut updated = self.contents.remove(from);
        updated.group_id = group_id;
        let screen_changed = updated.screen_id != screen_id;
        updated.screen_id = screen_id.clone();

        let at = match anchor {
            Some(Err(before)) => self.position(&before).unwrap_or(self.contents.len()),
            Some(Ok(after)) => self.position(&after).map_or(self.contents.len(), |i| i + 1),
            None => self.contents.len(),
        };
        self.contents.insert(at, updated.clone());

        let mut affected = vec![updated];
        if moved.is_group() && screen_changed {
            for child in self
                .contents
                .iter_mut()
                .filter(|c| c.group_id.as_deref() == Some(moved.id.as_str()))
            {
                child.screen_id = screen_id.clone();
                affected.push(child.clone());
            }
        }
        Ok(affected)
    }

    fn create_content(&mut self, draft: ContentDraft) -> Result<Content, RemoteError> {
        self.take_injected()?;
        if let Some(group_id) = &draft.group_id {
            self.existing_group(group_id)?;
        }
        let id = self.allocate_id();
        let content = draft.into_content(id);
        self.contents.push(content.clone());
        Ok(content)
    }

    fn update_content(&mut self, content: &Content) -> Result<Content, RemoteError> {
        self.take_injected()?;
        if let Some(group_id) = &content.group_id {
            self.existing_group(group_id)?;
        }
        let idx = self
            .position(&content.id)
            .ok_or_else(|| RemoteError::NotFound(content.id.clone()))?;
        self.contents[idx] = content.clone();
        Ok(content.clone())
    }

    fn probe_group(&mut self, group_id: &str) -> Result<Vec<Content>, RemoteError> {
        self.take_injected()?;
        let Ok(group) = self.existing_group(group_id) else {
            return Ok(Vec::new());
        };
        let mut found = vec![group.clone()];
        found.extend(
            self.contents
                .iter()
                .filter(|c| c.group_id.as_deref() == Some(group_id))
                .cloned(),
        );
        Ok(found)
    }

    fn delete_content(&mut self, content_id: &str) -> Result<Vec<ContentId>, RemoteError> {
        self.take_injected()?;
        if self.position(content_id).is_none() {
            return Err(RemoteError::NotFound(content_id.to_string()));
        }
        Ok(self.remove_with_children(content_id))
    }
}
