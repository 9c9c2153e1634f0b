use crate::error::{Result, StoreError};
use chrono::{DateTime, NaiveDateTime, Utc};
use comet::v1::NotebookId;
use std::path::{Path, PathBuf};

/// Timestamp suffix of version file names (UTC, second resolution).
pub const VERSION_TIME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

const NOTEBOOK_EXT: &str = "ipynb";
const VERSIONS_DIR: &str = "versions";

/// Where everything for a notebook lives under the data directory:
///
/// ```text
/// <data_dir>/<name>/<name>.ipynb
/// <data_dir>/<name>/<name>.actions.jsonl
/// <data_dir>/<name>/versions/<name>-2026-03-29-10-00-00.ipynb
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    data_dir: PathBuf,
}

impl StorageLayout {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn notebook_dir(&self, id: &NotebookId) -> Result<PathBuf> {
        validate_identity(id)?;
        Ok(self.data_dir.join(id.as_str()))
    }

    pub fn canonical_file(&self, id: &NotebookId) -> Result<PathBuf> {
        Ok(self
            .notebook_dir(id)?
            .join(format!("{}.{}", id, NOTEBOOK_EXT)))
    }

    pub fn action_log_file(&self, id: &NotebookId) -> Result<PathBuf> {
        Ok(self.notebook_dir(id)?.join(format!("{}.actions.jsonl", id)))
    }

    pub fn versions_dir(&self, id: &NotebookId) -> Result<PathBuf> {
        Ok(self.notebook_dir(id)?.join(VERSIONS_DIR))
    }

    pub fn version_file(&self, id: &NotebookId, at: DateTime<Utc>) -> Result<PathBuf> {
        Ok(self.versions_dir(id)?.join(version_file_name(id, at)))
    }

    /// Notebooks with a canonical snapshot, sorted by name.
    pub fn list_notebooks(&self) -> Result<Vec<NotebookId>> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }

        let mut notebooks = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir()
                && let Some(name) = entry.file_name().to_str()
            {
                let id = NotebookId::new(name);
                if self.canonical_file(&id).is_ok_and(|p| p.is_file()) {
                    notebooks.push(id);
                }
            }
        }
        notebooks.sort();
        Ok(notebooks)
    }

    /// Timestamps of stored versions, oldest first. Files whose names do not
    /// follow the version pattern are ignored.
    pub fn list_versions(&self, id: &NotebookId) -> Result<Vec<DateTime<Utc>>> {
        let dir = self.versions_dir(id)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file()
                && let Some(name) = entry.file_name().to_str()
                && let Some(at) = parse_version_timestamp(id, name)
            {
                versions.push(at);
            }
        }
        versions.sort();
        Ok(versions)
    }
}

pub fn version_file_name(id: &NotebookId, at: DateTime<Utc>) -> String {
    format!("{}-{}.{}", id, at.format(VERSION_TIME_FORMAT), NOTEBOOK_EXT)
}

/// Recover the timestamp from a version file name written by
/// [`version_file_name`].
pub fn parse_version_timestamp(id: &NotebookId, file_name: &str) -> Option<DateTime<Utc>> {
    let stamp = file_name
        .strip_prefix(id.as_str())?
        .strip_prefix('-')?
        .strip_suffix(NOTEBOOK_EXT)?
        .strip_suffix('.')?;
    NaiveDateTime::parse_from_str(stamp, VERSION_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Identities become directory names, so they must be a single plain path
/// component.
fn validate_identity(id: &NotebookId) -> Result<()> {
    let s = id.as_str();
    if s.is_empty() || s == "." || s == ".." || s.contains(['/', '\\']) {
        return Err(StoreError::InvalidIdentity(s.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 29, 10, 5, 9).unwrap()
    }

    #[test]
    fn test_layout_paths() {
        let layout = StorageLayout::new("/data");
        let id = NotebookId::new("analysis");
        assert_eq!(
            layout.canonical_file(&id).unwrap(),
            PathBuf::from("/data/analysis/analysis.ipynb")
        );
        assert_eq!(
            layout.action_log_file(&id).unwrap(),
            PathBuf::from("/data/analysis/analysis.actions.jsonl")
        );
        assert_eq!(
            layout.version_file(&id, at()).unwrap(),
            PathBuf::from("/data/analysis/versions/analysis-2026-03-29-10-05-09.ipynb")
        );
    }

    #[test]
    fn test_invalid_identities_rejected() {
        let layout = StorageLayout::new("/data");
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            let err = layout.notebook_dir(&NotebookId::new(bad)).unwrap_err();
            assert!(matches!(err, StoreError::InvalidIdentity(_)));
        }
    }

    #[test]
    fn test_version_name_roundtrip() {
        let id = NotebookId::new("my-notebook");
        let name = version_file_name(&id, at());
        assert_eq!(parse_version_timestamp(&id, &name), Some(at()));
    }

    #[test]
    fn test_parse_version_rejects_foreign_names() {
        let id = NotebookId::new("nb");
        assert!(parse_version_timestamp(&id, "nb.ipynb").is_none());
        assert!(parse_version_timestamp(&id, "other-2026-03-29-10-05-09.ipynb").is_none());
        assert!(parse_version_timestamp(&id, "nb-2026-03-29-10-05-09.txt").is_none());
        assert!(parse_version_timestamp(&id, "nb-yesterday.ipynb").is_none());
    }

    #[test]
    fn test_list_versions_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp.path());
        let id = NotebookId::new("nb");
        let dir = layout.versions_dir(&id).unwrap();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("nb-2026-03-29-10-07-00.ipynb"), "{}").unwrap();
        fs::write(dir.join("nb-2026-03-29-10-05-09.ipynb"), "{}").unwrap();
        fs::write(dir.join("notes.txt"), "").unwrap();

        let versions = layout.list_versions(&id).unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0], at());
    }

    #[test]
    fn test_list_notebooks_requires_canonical() {
        let temp = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp.path());
        fs::create_dir_all(temp.path().join("b")).unwrap();
        fs::write(temp.path().join("b/b.ipynb"), "{}").unwrap();
        fs::create_dir_all(temp.path().join("a")).unwrap();
        fs::write(temp.path().join("a/a.ipynb"), "{}").unwrap();
        fs::create_dir_all(temp.path().join("empty")).unwrap();

        let notebooks = layout.list_notebooks().unwrap();
        assert_eq!(notebooks, vec![NotebookId::new("a"), NotebookId::new("b")]);
    }

    #[test]
    fn test_missing_data_dir_lists_nothing() {
        let layout = StorageLayout::new("/definitely/not/here");
        assert!(layout.list_notebooks().unwrap().is_empty());
        assert!(layout.list_versions(&NotebookId::new("nb")).unwrap().is_empty());
    }
}
