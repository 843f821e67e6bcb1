use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::tree::MovePlacement;

/// Configuration from project.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub project: ProjectInfo,
    #[serde(default)]
    pub groups: GroupConfig,
    #[serde(default)]
    pub locale: LocaleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
}

/// Group numbering and placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Step between default group numbers ("Group", "Group - 10", "Group - 20")
    #[serde(default = "default_title_gap")]
    pub title_gap: u32,
    /// Where a newly created group lands in its root list
    #[serde(default = "default_new_group_position")]
    pub new_group_position: MovePlacement,
}

impl Default for GroupConfig {
    fn default() -> Self {
        GroupConfig {
            title_gap: default_title_gap(),
            new_group_position: default_new_group_position(),
        }
    }
}

fn default_title_gap() -> u32 {
    10
}

fn default_new_group_position() -> MovePlacement {
    MovePlacement::Last
}

/// Localized strings used by group numbering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleConfig {
    #[serde(default = "default_language")]
    pub language: String,
    /// Per-language overrides, keyed by language code
    #[serde(default)]
    pub strings: HashMap<String, LocaleStrings>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        LocaleConfig {
            language: default_language(),
            strings: HashMap::new(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleStrings {
    /// Prefix of default group titles
    pub group_name: String,
    /// Title of the fallback group that receives orphaned contents
    pub temporary_group: String,
}

impl LocaleStrings {
    fn builtin(language: &str) -> Self {
        let (group_name, temporary_group) = match language {
            "de" => ("Gruppe", "Temporäre Gruppe"),
            "fr" => ("Groupe", "Groupe temporaire"),
            "ja" => ("グループ", "一時グループ"),
            _ => ("Group", "Temporary group"),
        };
        LocaleStrings {
            group_name: group_name.to_string(),
            temporary_group: temporary_group.to_string(),
        }
    }
}

impl LocaleConfig {
    /// Strings for the configured language; configured overrides win over
    /// the built-in table, unknown languages fall back to English.
    pub fn strings(&self) -> LocaleStrings {
        self.strings
            .get(&self.language)
            .cloned()
            .unwrap_or_else(|| LocaleStrings::builtin(&self.language))
    }

    pub fn group_name(&self) -> String {
        self.strings().group_name
    }

    pub fn temporary_group(&self) -> String {
        self.strings().temporary_group
    }
}

/// The subset of configuration the engine consumes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub groups: GroupConfig,
    pub locale: LocaleConfig,
}

impl From<&ProjectConfig> for EngineConfig {
    fn from(config: &ProjectConfig) -> Self {
        EngineConfig {
            groups: config.groups.clone(),
            locale: config.locale.clone(),
        }
    }
}
