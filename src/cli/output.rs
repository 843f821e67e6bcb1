use serde::Serialize;

use crate::model::content::{Category, Content, ContentKind};
use crate::model::state::{Intent, TreeState};
use crate::model::tree::Bucket;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct NodeJson {
    pub id: String,
    pub title: String,
    pub kind: ContentKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeJson>,
}

#[derive(Serialize)]
pub struct ListJson {
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_id: Option<String>,
    pub items: Vec<NodeJson>,
}

#[derive(Serialize)]
pub struct TreeJson {
    pub lists: Vec<ListJson>,
}

/// Which root lists to show
#[derive(Debug, Clone, Default)]
pub struct TreeFilter {
    pub category: Option<Category>,
    pub screen: Option<String>,
}

impl TreeFilter {
    fn accepts(&self, bucket: &Bucket) -> bool {
        self.category.is_none_or(|c| c == bucket.category)
            && match (&self.screen, &bucket.screen_id) {
                (Some(wanted), Some(screen)) => wanted == screen,
                _ => true,
            }
    }
}

/// Every non-empty root list, pinned first, in category order
fn visible_lists<'a>(state: &'a TreeState, filter: &TreeFilter) -> Vec<(Bucket, &'a [String])> {
    let mut lists = Vec::new();
    for category in Category::ALL {
        let Some(bucket) = state.tree.bucket(category) else {
            continue;
        };
        let pinned = std::iter::once((Bucket::pinned(category), bucket.pinned.as_slice()));
        let unpinned = bucket
            .unpinned
            .iter()
            .map(|(screen, ids)| (Bucket::unpinned(category, screen.clone()), ids.as_slice()));
        lists.extend(
            pinned
                .chain(unpinned)
                .filter(|(b, ids)| !ids.is_empty() && filter.accepts(b)),
        );
    }
    lists
}

fn node_json(state: &TreeState, content: &Content) -> NodeJson {
    let children = if content.is_group() {
        state
            .tree
            .children(&content.id)
            .iter()
            .filter_map(|id| state.store.get(id))
            .map(|child| node_json(state, child))
            .collect()
    } else {
        Vec::new()
    };
    NodeJson {
        id: content.id.clone(),
        title: content.title.clone(),
        kind: content.kind,
        children,
    }
}

pub fn tree_to_json(state: &TreeState, filter: &TreeFilter) -> TreeJson {
    let lists = visible_lists(state, filter)
        .into_iter()
        .map(|(bucket, ids)| ListJson {
            category: bucket.category,
            screen_id: bucket.screen_id,
            items: ids
                .iter()
                .filter_map(|id| state.store.get(id))
                .map(|c| node_json(state, c))
                .collect(),
        })
        .collect();
    TreeJson { lists }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn kind_name(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Group => "group",
        ContentKind::Layer => "layer",
        ContentKind::Measurement => "measurement",
        ContentKind::Annotation => "annotation",
        ContentKind::Blueprint => "blueprint",
        ContentKind::Equipment => "equipment",
    }
}

/// Format a single content as a one-line summary
pub fn format_content_line(content: &Content) -> String {
    let marker = if content.is_group() { "+" } else { "-" };
    format!("{} {} {} ({})", marker, content.id, content.title, kind_name(content.kind))
}

/// Format every visible root list with its groups' children indented
pub fn format_tree(state: &TreeState, filter: &TreeFilter) -> Vec<String> {
    let mut lines = Vec::new();
    for (bucket, ids) in visible_lists(state, filter) {
        lines.push(bucket.to_string());
        for content in ids.iter().filter_map(|id| state.store.get(id)) {
            lines.push(format!("  {}", format_content_line(content)));
            if content.is_group() {
                let children = state.tree.children(&content.id);
                for child in children.iter().filter_map(|id| state.store.get(id)) {
                    lines.push(format!("    {}", format_content_line(child)));
                }
            }
        }
    }
    if lines.is_empty() {
        lines.push("(no contents)".to_string());
    }
    lines
}

pub fn format_intent(intent: &Intent) -> String {
    match intent {
        Intent::ExpandGroup { group_id } => format!("expanded group {}", group_id),
        Intent::StartRename { content_id } => format!("rename {}", content_id),
        Intent::ClearSelection { category } => format!("cleared {} selection", category),
        Intent::CreatePlaceholderGroup {
            category,
            screen_id,
        } => format!(
            "{} needs a placeholder group",
            Bucket {
                category: *category,
                screen_id: screen_id.clone(),
            }
        ),
    }
}
