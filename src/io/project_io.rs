use std::fs;
use std::path::{Path, PathBuf};

use crate::io::store_io::{self, STORE_FILE};
use crate::model::config::ProjectConfig;

/// Directory holding a project's config and content store
pub const PROJECT_DIR: &str = "contree";

const CONFIG_FILE: &str = "project.toml";

const PROJECT_TOML_TEMPLATE: &str = r##"[project]
name = "{name}"

[groups]
# Step between default group numbers: "Group", "Group - 10", "Group - 20"
title_gap = 10
# Where new groups land in their list: "first" or "last"
new_group_position = "last"

[locale]
language = "{language}"

# Override the built-in strings for a language:
#
# [locale.strings.en]
# group_name = "Folder"
# temporary_group = "Recovered items"
"##;

/// Error type for project I/O operations
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("not a contree project: no contree/ directory found")]
    NotAProject,
    #[error("contree project already exists in {0}")]
    AlreadyExists(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse project.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not parse {path}: {source}")]
    StoreParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize contents: {0}")]
    StoreSerializeError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A loaded project: where it lives and how it is configured
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub dir: PathBuf,
    pub config: ProjectConfig,
}

impl Project {
    pub fn store_path(&self) -> PathBuf {
        self.dir.join(STORE_FILE)
    }
}

/// Discover the project by walking up from the given directory, looking for
/// a `contree/` subdirectory with a project.toml.
pub fn discover_project(start: &Path) -> Result<PathBuf, ProjectError> {
    let mut current = start.to_path_buf();
    loop {
        let dir = current.join(PROJECT_DIR);
        if dir.is_dir() && dir.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ProjectError::NotAProject);
        }
    }
}

/// Load the project rooted at `root`
pub fn load_project(root: &Path) -> Result<Project, ProjectError> {
    let dir = root.join(PROJECT_DIR);
    if !dir.is_dir() {
        return Err(ProjectError::NotAProject);
    }

    let config_path = dir.join(CONFIG_FILE);
    let config_text = fs::read_to_string(&config_path).map_err(|e| ProjectError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: ProjectConfig = toml::from_str(&config_text)?;

    Ok(Project {
        root: root.to_path_buf(),
        dir,
        config,
    })
}

/// Create `contree/` under `root` with a commented project.toml and an empty
/// content store.
pub fn init_project(
    root: &Path,
    name: Option<String>,
    language: &str,
) -> Result<Project, ProjectError> {
    let dir = root.join(PROJECT_DIR);
    if dir.is_dir() {
        return Err(ProjectError::AlreadyExists(dir));
    }

    let name = name.unwrap_or_else(|| {
        root.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .unwrap_or_else(|| "Untitled".to_string())
    });

    fs::create_dir_all(&dir)?;
    let toml_content = PROJECT_TOML_TEMPLATE
        .replace("{name}", &name)
        .replace("{language}", language);
    store_io::atomic_write(&dir.join(CONFIG_FILE), toml_content.as_bytes())?;
    store_io::save_contents(&dir.join(STORE_FILE), &[])?;

    load_project(root)
}

/// Infer a project name from a directory name: hyphens become spaces, words
/// are title-cased.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + chars.as_str()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
