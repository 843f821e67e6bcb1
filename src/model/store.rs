use indexmap::IndexMap;

use super::content::{Content, ContentId};

/// The flat, ordered list of contents known to this client
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentStore {
    contents: IndexMap<ContentId, Content>,
}

impl ContentStore {
    pub fn new() -> Self {
        ContentStore::default()
    }

    /// Replace the whole list, keeping the given order
    pub fn replace_all(&mut self, contents: Vec<Content>) {
        self.contents = contents.into_iter().map(|c| (c.id.clone(), c)).collect();
    }

    pub fn get(&self, id: &str) -> Option<&Content> {
        self.contents.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.contents.contains_key(id)
    }

    /// Insert a new content at the end, or replace an existing one in place
    pub fn upsert(&mut self, content: Content) {
        self.contents.insert(content.id.clone(), content);
    }

    /// Apply an authoritative set of changed contents (edges, titles)
    pub fn update_contents(&mut self, affected: &[Content]) {
        for content in affected {
            self.upsert(content.clone());
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Content> {
        self.contents.shift_remove(id)
    }

    /// Contents whose `group_id` is `group_id`, in store order
    pub fn children_of(&self, group_id: &str) -> Vec<Content> {
        self.contents
            .values()
            .filter(|c| c.group_id.as_deref() == Some(group_id))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Content> {
        self.contents.values()
    }

    /// Snapshot in store order, as fed to a rebuild
    pub fn to_vec(&self) -> Vec<Content> {
        self.contents.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::content::{Category, ContentKind};

    #[test]
    fn update_contents_replaces_edges_in_place() {
        let mut store = ContentStore::new();
        store.replace_all(vec![
            Content::new("1", Category::Overlay, ContentKind::Layer),
            Content::new("2", Category::Overlay, ContentKind::Layer),
        ]);
        store.update_contents(&[
            Content::new("1", Category::Overlay, ContentKind::Layer).with_group("g")
        ]);

        let ids: Vec<&str> = store.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(store.get("1").unwrap().group_id.as_deref(), Some("g"));
    }

    #[test]
    fn children_of_filters_by_group() {
        let mut store = ContentStore::new();
        store.replace_all(vec![
            Content::new("g", Category::Overlay, ContentKind::Group),
            Content::new("a", Category::Overlay, ContentKind::Layer).with_group("g"),
            Content::new("b", Category::Overlay, ContentKind::Layer),
            Content::new("c", Category::Overlay, ContentKind::Layer).with_group("g"),
        ]);
        let ids: Vec<String> = store.children_of("g").into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
