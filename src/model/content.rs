use serde::{Deserialize, Serialize};

/// Opaque, stable content identifier
pub type ContentId = String;

/// Identifier of the screen an unpinned content is scoped to
pub type ScreenId = String;

/// Coarse partition of content types; every category owns one root bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Overlay,
    Measurement,
    Ess,
    Map,
    Metadata,
}

impl Category {
    /// All categories, in display order
    pub const ALL: [Category; 5] = [
        Category::Overlay,
        Category::Measurement,
        Category::Ess,
        Category::Map,
        Category::Metadata,
    ];

    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "overlay" => Some(Category::Overlay),
            "measurement" => Some(Category::Measurement),
            "ess" => Some(Category::Ess),
            "map" => Some(Category::Map),
            "metadata" => Some(Category::Metadata),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Overlay => write!(f, "overlay"),
            Category::Measurement => write!(f, "measurement"),
            Category::Ess => write!(f, "ess"),
            Category::Map => write!(f, "map"),
            Category::Metadata => write!(f, "metadata"),
        }
    }
}

/// Content type discriminant. Only `Group` is a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Group,
    Layer,
    Measurement,
    Annotation,
    Blueprint,
    Equipment,
}

impl ContentKind {
    pub fn parse_kind(s: &str) -> Option<Self> {
        match s {
            "group" => Some(ContentKind::Group),
            "layer" => Some(ContentKind::Layer),
            "measurement" => Some(ContentKind::Measurement),
            "annotation" => Some(ContentKind::Annotation),
            "blueprint" => Some(ContentKind::Blueprint),
            "equipment" => Some(ContentKind::Equipment),
            _ => None,
        }
    }
}

/// An organizable item: a map layer, measurement, annotation, or group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: ContentId,
    /// Parent group, `None` for root-level contents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<ContentId>,
    /// Owning screen, `None` for pinned contents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_id: Option<ScreenId>,
    pub category: Category,
    pub kind: ContentKind,
    #[serde(default)]
    pub title: String,
    /// Type-specific data, never inspected by the tree engine
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl Content {
    pub fn new(id: impl Into<ContentId>, category: Category, kind: ContentKind) -> Self {
        Content {
            id: id.into(),
            group_id: None,
            screen_id: None,
            category,
            kind,
            title: String::new(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_group(mut self, group_id: impl Into<ContentId>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn with_screen(mut self, screen_id: impl Into<ScreenId>) -> Self {
        self.screen_id = Some(screen_id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn is_group(&self) -> bool {
        self.kind == ContentKind::Group
    }

    pub fn is_root(&self) -> bool {
        self.group_id.is_none()
    }

    pub fn is_pinned(&self) -> bool {
        self.screen_id.is_none()
    }
}

/// A content not yet assigned an id by the remote authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<ContentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_id: Option<ScreenId>,
    pub category: Category,
    pub kind: ContentKind,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl ContentDraft {
    /// An empty group draft for a root partition
    pub fn group(category: Category, screen_id: Option<ScreenId>, title: String) -> Self {
        ContentDraft {
            group_id: None,
            screen_id,
            category,
            kind: ContentKind::Group,
            title,
            payload: serde_json::Value::Null,
        }
    }

    /// Duplicate `source` into `group`, keeping its kind, title and payload.
    /// The copy inherits the destination group's screen.
    pub fn duplicate_of(source: &Content, group: &Content) -> Self {
        ContentDraft {
            group_id: Some(group.id.clone()),
            screen_id: group.screen_id.clone(),
            category: source.category,
            kind: source.kind,
            title: source.title.clone(),
            payload: source.payload.clone(),
        }
    }

    /// Materialize with an id assigned by the authority
    pub fn into_content(self, id: ContentId) -> Content {
        Content {
            id,
            group_id: self.group_id,
            screen_id: self.screen_id,
            category: self.category,
            kind: self.kind,
            title: self.title,
            payload: self.payload,
        }
    }
}

impl From<&Content> for ContentDraft {
    fn from(content: &Content) -> Self {
        ContentDraft {
            group_id: content.group_id.clone(),
            screen_id: content.screen_id.clone(),
            category: content.category,
            kind: content.kind,
            title: content.title.clone(),
            payload: content.payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_skips_absent_edges() {
        let c = Content::new("7", Category::Overlay, ContentKind::Layer).with_title("Roads");
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"id":"7","category":"overlay","kind":"layer","title":"Roads"}"#);

        let back: Content = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn duplicate_inherits_destination_screen() {
        let group = Content::new("g", Category::Overlay, ContentKind::Group).with_screen("s1");
        let source = Content::new("a", Category::Overlay, ContentKind::Layer)
            .with_group("other")
            .with_title("Roads");
        let draft = ContentDraft::duplicate_of(&source, &group);
        assert_eq!(draft.group_id.as_deref(), Some("g"));
        assert_eq!(draft.screen_id.as_deref(), Some("s1"));
        assert_eq!(draft.title, "Roads");
    }

    #[test]
    fn parse_category_and_kind() {
        for c in Category::ALL {
            assert_eq!(Category::parse_category(&c.to_string()), Some(c));
        }
        assert_eq!(ContentKind::parse_kind("group"), Some(ContentKind::Group));
        assert_eq!(ContentKind::parse_kind("folder"), None);
    }
}
