use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, error};

use crate::io::project_io::ProjectError;
use crate::model::content::{Content, ContentDraft, ContentId};
use crate::remote::{MemoryAuthority, MoveRequest, RemoteAuthority, RemoteError};

/// Canonical content list, relative to the project directory
pub const STORE_FILE: &str = "contents.json";

/// Write via a temp file in the same directory, then rename over `path`.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read the canonical list. A missing file is an empty project.
pub fn load_contents(path: &Path) -> Result<Vec<Content>, ProjectError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path).map_err(|e| ProjectError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| ProjectError::StoreParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn save_contents(path: &Path, contents: &[Content]) -> Result<(), ProjectError> {
    let mut json = serde_json::to_string_pretty(contents)?;
    json.push('\n');
    atomic_write(path, json.as_bytes())?;
    Ok(())
}

/// An authority backed by a JSON file: the in-memory protocol, written back
/// to disk after every successful change.
#[derive(Debug)]
pub struct FileAuthority {
    path: PathBuf,
    inner: MemoryAuthority,
}

impl FileAuthority {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ProjectError> {
        let path = path.into();
        let contents = load_contents(&path)?;
        debug!(path = %path.display(), count = contents.len(), "loaded content store");
        Ok(FileAuthority {
            path,
            inner: MemoryAuthority::new(contents),
        })
    }

    pub fn contents(&self) -> &[Content] {
        self.inner.contents()
    }

    fn persist(&self) -> Result<(), RemoteError> {
        save_contents(&self.path, self.inner.contents()).map_err(|e| {
            error!(path = %self.path.display(), error = %e, "could not write content store");
            RemoteError::Transient(e.to_string())
        })
    }

    /// Apply `op` to the in-memory list and write it out. A failed write
    /// rolls the list back so memory and disk stay in step.
    fn mutate<T>(
        &mut self,
        op: impl FnOnce(&mut MemoryAuthority) -> Result<T, RemoteError>,
    ) -> Result<T, RemoteError> {
        let snapshot = self.inner.clone();
        let value = op(&mut self.inner)?;
        if let Err(e) = self.persist() {
            self.inner = snapshot;
            return Err(e);
        }
        Ok(value)
    }
}

impl RemoteAuthority for FileAuthority {
    fn move_content(
        &mut self,
        content_id: &str,
        request: &MoveRequest,
    ) -> Result<Vec<Content>, RemoteError> {
        self.mutate(|inner| inner.move_content(content_id, request))
    }

    fn create_content(&mut self, draft: ContentDraft) -> Result<Content, RemoteError> {
        self.mutate(|inner| inner.create_content(draft))
    }

    fn update_content(&mut self, content: &Content) -> Result<Content, RemoteError> {
        self.mutate(|inner| inner.update_content(content))
    }

    fn probe_group(&mut self, group_id: &str) -> Result<Vec<Content>, RemoteError> {
        self.inner.probe_group(group_id)
    }

    fn delete_content(&mut self, content_id: &str) -> Result<Vec<ContentId>, RemoteError> {
        self.mutate(|inner| inner.delete_content(content_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::content::{Category, ContentKind};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn layer(id: &str) -> Content {
        Content::new(id, Category::Map, ContentKind::Layer).with_title(format!("Layer {}", id))
    }

    #[test]
    fn missing_store_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(load_contents(&tmp.path().join(STORE_FILE)).unwrap().is_empty());
    }

    #[test]
    fn changes_survive_reopening() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(STORE_FILE);
        save_contents(&path, &[layer("1"), layer("2")]).unwrap();

        let mut authority = FileAuthority::open(&path).unwrap();
        let request = MoveRequest {
            screen_id: None,
            pos_content_id: Some("1".into()),
            append_mode: false,
        };
        authority.move_content("2", &request).unwrap();
        let group = authority
            .create_content(ContentDraft::group(Category::Map, None, "Group".into()))
            .unwrap();
        assert_eq!(group.id, "3");

        let reopened = FileAuthority::open(&path).unwrap();
        let ids: Vec<&str> = reopened.contents().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
        assert_eq!(reopened.contents()[0].title, "Layer 2");
    }

    #[test]
    fn failed_call_does_not_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(STORE_FILE);
        save_contents(&path, &[layer("1")]).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let mut authority = FileAuthority::open(&path).unwrap();
        assert!(authority.delete_content("9").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn failed_write_rolls_back_memory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("store");
        fs::create_dir(&dir).unwrap();
        let path = dir.join(STORE_FILE);
        save_contents(&path, &[layer("1")]).unwrap();

        let mut authority = FileAuthority::open(&path).unwrap();
        fs::remove_dir_all(&dir).unwrap();
        let err = authority
            .create_content(ContentDraft::group(Category::Map, None, "Group".into()))
            .unwrap_err();
        assert!(matches!(err, RemoteError::Transient(_)));
        assert_eq!(authority.contents().len(), 1);

        // The id handed out by the failed call is reused once writes work
        fs::create_dir(&dir).unwrap();
        let group = authority
            .create_content(ContentDraft::group(Category::Map, None, "Group".into()))
            .unwrap();
        assert_eq!(group.id, "2");
        assert_eq!(load_contents(&path).unwrap().len(), 2);
    }

    #[test]
    fn corrupt_store_reports_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(STORE_FILE);
        fs::write(&path, "[{").unwrap();
        let err = FileAuthority::open(&path).unwrap_err();
        assert!(matches!(err, ProjectError::StoreParseError { .. }));
        assert!(err.to_string().contains("contents.json"));
    }
}
