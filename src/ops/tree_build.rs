use crate::model::content::Content;
use crate::model::tree::Tree;

/// Rebuild the whole tree from the authoritative flat list, in one pass.
///
/// Groups get a children entry on first sight. A child seen before its parent
/// creates the parent's entry on demand, so input order only affects ordering
/// within lists, never membership.
pub fn rebuild(contents: &[Content]) -> Tree {
    let mut tree = Tree::empty();

    for content in contents {
        if content.is_group() {
            tree.ids_by_group.entry(content.id.clone()).or_default();
        }

        match &content.group_id {
            Some(group_id) => {
                tree.ids_by_group
                    .entry(group_id.clone())
                    .or_default()
                    .push(content.id.clone());
            }
            None => {
                tree.bucket_mut(content.category)
                    .list_mut(content.screen_id.as_deref())
                    .push(content.id.clone());
            }
        }
    }

    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::content::{Category, ContentKind};
    use pretty_assertions::assert_eq;

    fn layer(id: &str) -> Content {
        Content::new(id, Category::Overlay, ContentKind::Layer)
    }

    fn group(id: &str) -> Content {
        Content::new(id, Category::Overlay, ContentKind::Group)
    }

    fn sample_contents() -> Vec<Content> {
        vec![
            group("10"),
            layer("11").with_group("10"),
            layer("12").with_group("10"),
            layer("1"),
            layer("2").with_screen("s1"),
            Content::new("3", Category::Measurement, ContentKind::Measurement),
            group("20").with_screen("s1"),
        ]
    }

    #[test]
    fn rebuild_places_every_content_once() {
        let contents = sample_contents();
        let tree = rebuild(&contents);

        for c in &contents {
            assert_eq!(tree.occurrences(&c.id), 1, "content {}", c.id);
        }
        assert_eq!(tree.children("10"), &["11".to_string(), "12".to_string()]);
        assert!(tree.ids_by_group.contains_key("20"));
        assert!(tree.children("20").is_empty());

        let overlay = tree.bucket(Category::Overlay).unwrap();
        assert_eq!(overlay.pinned, vec!["10", "1"]);
        assert_eq!(overlay.unpinned["s1"], vec!["2", "20"]);
        assert_eq!(tree.bucket(Category::Measurement).unwrap().pinned, vec!["3"]);
    }

    #[test]
    fn rebuild_is_deterministic() {
        let contents = sample_contents();
        assert_eq!(rebuild(&contents), rebuild(&contents));
    }

    #[test]
    fn rebuild_tolerates_child_before_parent() {
        let contents = vec![
            layer("11").with_group("10"),
            group("10"),
            layer("12").with_group("10"),
        ];
        let tree = rebuild(&contents);
        assert_eq!(tree.children("10"), &["11".to_string(), "12".to_string()]);
        assert_eq!(tree.bucket(Category::Overlay).unwrap().pinned, vec!["10"]);
    }

    #[test]
    fn rebuild_empty_prepopulates_categories() {
        let tree = rebuild(&[]);
        assert_eq!(tree, Tree::empty());
        assert_eq!(tree.root_ids_by_category.len(), 5);
    }
}
