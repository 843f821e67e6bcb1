use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::content::{Category, Content, ContentId, ScreenId};

/// Root lists of one category, split by pinned/unpinned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBucket {
    /// Contents visible on every screen
    pub pinned: Vec<ContentId>,
    /// Contents scoped to one screen, keyed by screen id
    #[serde(default)]
    pub unpinned: IndexMap<ScreenId, Vec<ContentId>>,
}

impl CategoryBucket {
    /// The root list for a screen (`None` = pinned), if it exists
    pub fn list(&self, screen_id: Option<&str>) -> Option<&Vec<ContentId>> {
        match screen_id {
            None => Some(&self.pinned),
            Some(screen) => self.unpinned.get(screen),
        }
    }

    /// The root list for a screen, creating an unpinned list on demand
    pub fn list_mut(&mut self, screen_id: Option<&str>) -> &mut Vec<ContentId> {
        match screen_id {
            None => &mut self.pinned,
            Some(screen) => self.unpinned.entry(screen.to_string()).or_default(),
        }
    }

    /// The root list for a screen, without creating one
    pub fn existing_list_mut(&mut self, screen_id: Option<&str>) -> Option<&mut Vec<ContentId>> {
        match screen_id {
            None => Some(&mut self.pinned),
            Some(screen) => self.unpinned.get_mut(screen),
        }
    }

    /// Every root list of this category, pinned first
    pub fn lists_mut(&mut self) -> impl Iterator<Item = &mut Vec<ContentId>> {
        std::iter::once(&mut self.pinned).chain(self.unpinned.values_mut())
    }
}

/// The two-level content hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Ordered children of every group, keyed by the group's id
    pub ids_by_group: IndexMap<ContentId, Vec<ContentId>>,
    /// Root-level contents per category
    pub root_ids_by_category: IndexMap<Category, CategoryBucket>,
}

impl Default for Tree {
    fn default() -> Self {
        Tree::empty()
    }
}

impl Tree {
    /// A tree with every category bucket present and empty
    pub fn empty() -> Self {
        Tree {
            ids_by_group: IndexMap::new(),
            root_ids_by_category: Category::ALL
                .iter()
                .map(|c| (*c, CategoryBucket::default()))
                .collect(),
        }
    }

    pub fn bucket(&self, category: Category) -> Option<&CategoryBucket> {
        self.root_ids_by_category.get(&category)
    }

    pub fn bucket_mut(&mut self, category: Category) -> &mut CategoryBucket {
        self.root_ids_by_category.entry(category).or_default()
    }

    /// Ordered children of a group
    pub fn children(&self, group_id: &str) -> &[ContentId] {
        self.ids_by_group
            .get(group_id)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// The root list a bucket maps to (empty slice if the screen has none yet)
    pub fn root_list(&self, bucket: &Bucket) -> &[ContentId] {
        self.bucket(bucket.category)
            .and_then(|b| b.list(bucket.screen_id.as_deref()))
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// The list a content currently belongs to according to its edges
    pub fn container_of(&self, content: &Content) -> &[ContentId] {
        match &content.group_id {
            Some(group_id) => self.children(group_id),
            None => self.root_list(&Bucket::of(content)),
        }
    }

    /// Number of slots holding `id`, across every list in the tree
    pub fn occurrences(&self, id: &str) -> usize {
        let in_groups = self
            .ids_by_group
            .values()
            .flatten()
            .filter(|c| c.as_str() == id)
            .count();
        let in_roots = self
            .root_ids_by_category
            .values()
            .flat_map(|b| std::iter::once(&b.pinned).chain(b.unpinned.values()))
            .flatten()
            .filter(|c| c.as_str() == id)
            .count();
        in_groups + in_roots
    }
}

/// A root partition: one category, pinned (`screen_id = None`) or one screen
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bucket {
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_id: Option<ScreenId>,
}

impl Bucket {
    pub fn pinned(category: Category) -> Self {
        Bucket {
            category,
            screen_id: None,
        }
    }

    pub fn unpinned(category: Category, screen_id: impl Into<ScreenId>) -> Self {
        Bucket {
            category,
            screen_id: Some(screen_id.into()),
        }
    }

    /// The root partition a content lives in (or would, if ungrouped)
    pub fn of(content: &Content) -> Self {
        Bucket {
            category: content.category,
            screen_id: content.screen_id.clone(),
        }
    }

    pub fn contains(&self, content: &Content) -> bool {
        content.category == self.category && content.screen_id == self.screen_id
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.screen_id {
            None => write!(f, "{}/pinned", self.category),
            Some(screen) => write!(f, "{}/{}", self.category, screen),
        }
    }
}

/// Relative insertion directive for a list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOption {
    /// Insert at the start
    First,
    /// Append to the end
    Last,
    /// Insert in front of this content
    Previous(ContentId),
    /// Insert right after this content
    Next(ContentId),
}

/// Anchor-free subset of `MoveOption`, usable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovePlacement {
    First,
    Last,
}

impl From<MovePlacement> for MoveOption {
    fn from(placement: MovePlacement) -> Self {
        match placement {
            MovePlacement::First => MoveOption::First,
            MovePlacement::Last => MoveOption::Last,
        }
    }
}
