use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::content::{Category, ContentId, ScreenId};
use super::store::ContentStore;
use super::tree::Tree;

/// Client-side pointers into the tree that recovery must keep valid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiState {
    /// Content currently being edited inline
    #[serde(default)]
    pub editing: Option<ContentId>,
    /// Selected group per category tab
    #[serde(default)]
    pub selected_groups: HashMap<Category, ContentId>,
    /// Groups shown expanded
    #[serde(default)]
    pub expanded: HashSet<ContentId>,
}

/// Everything the engine reads and writes, owned by one caller
#[derive(Debug, Clone, Default)]
pub struct TreeState {
    pub store: ContentStore,
    pub tree: Tree,
    pub ui: UiState,
    /// Intents emitted since the last drain
    pub outbox: Vec<Intent>,
}

impl TreeState {
    pub fn emit(&mut self, intent: Intent) {
        self.outbox.push(intent);
    }

    pub fn drain_intents(&mut self) -> Vec<Intent> {
        std::mem::take(&mut self.outbox)
    }

    /// Mark a group expanded, emitting `ExpandGroup` if it was collapsed
    pub fn expand_group(&mut self, group_id: &str) {
        if self.ui.expanded.insert(group_id.to_string()) {
            self.emit(Intent::ExpandGroup {
                group_id: group_id.to_string(),
            });
        }
    }
}

/// How an operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// Local state now reflects the confirmed change
    Applied,
    /// Nothing to do: aborted gesture, or already in place
    Unchanged,
    /// Cancelled while waiting on the authority; no effects were applied
    Cancelled,
}

/// Side effects for the presentation layer; emitted, never performed here
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    ExpandGroup {
        group_id: ContentId,
    },
    StartRename {
        content_id: ContentId,
    },
    ClearSelection {
        category: Category,
    },
    /// A root partition lost its last group and should get an empty one
    CreatePlaceholderGroup {
        category: Category,
        screen_id: Option<ScreenId>,
    },
}
