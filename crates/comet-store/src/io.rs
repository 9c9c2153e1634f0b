use crate::action_log::ActionLogFile;
use crate::error::{Result, StoreError};
use crate::paths::StorageLayout;
use chrono::{DateTime, Utc};
use comet::v1::{LogEntry, Notebook, NotebookId};
use std::path::{Path, PathBuf};

/// Notebook snapshots, versions and action logs on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStore {
    layout: StorageLayout,
}

impl FsStore {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            layout: StorageLayout::new(data_dir),
        }
    }

    pub fn with_layout(layout: StorageLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// The canonical snapshot, or `None` if the notebook was never stored.
    pub fn read_canonical(&self, id: &NotebookId) -> Result<Option<Notebook>> {
        let path = self.layout.canonical_file(id)?;
        if !path.exists() {
            return Ok(None);
        }
        read_notebook(&path).map(Some)
    }

    pub fn write_canonical(&self, id: &NotebookId, notebook: &Notebook) -> Result<PathBuf> {
        let path = self.layout.canonical_file(id)?;
        write_notebook_atomic(&path, notebook)?;
        Ok(path)
    }

    /// Write a version copy. A second write at the same timestamp replaces
    /// the first.
    pub fn write_version(
        &self,
        id: &NotebookId,
        notebook: &Notebook,
        at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let path = self.layout.version_file(id, at)?;
        write_notebook_atomic(&path, notebook)?;
        Ok(path)
    }

    pub fn read_version(&self, id: &NotebookId, at: DateTime<Utc>) -> Result<Notebook> {
        let path = self.layout.version_file(id, at)?;
        if !path.exists() {
            return Err(StoreError::VersionNotFound {
                notebook: id.to_string(),
                at: at.to_rfc3339(),
            });
        }
        read_notebook(&path)
    }

    pub fn latest_version(&self, id: &NotebookId) -> Result<Option<DateTime<Utc>>> {
        Ok(self.layout.list_versions(id)?.into_iter().max())
    }

    pub fn list_versions(&self, id: &NotebookId) -> Result<Vec<DateTime<Utc>>> {
        self.layout.list_versions(id)
    }

    pub fn list_notebooks(&self) -> Result<Vec<NotebookId>> {
        self.layout.list_notebooks()
    }

    pub fn append_action(&self, id: &NotebookId, entry: &LogEntry) -> Result<()> {
        ActionLogFile::append(self.layout.action_log_file(id)?, entry)
    }

    pub fn read_actions(&self, id: &NotebookId) -> Result<Vec<LogEntry>> {
        let path = self.layout.action_log_file(id)?;
        if !self.layout.notebook_dir(id)?.exists() {
            return Err(StoreError::NotebookNotFound(id.to_string()));
        }
        ActionLogFile::read_entries(path)
    }

    pub fn notebook_exists(&self, id: &NotebookId) -> bool {
        self.layout
            .canonical_file(id)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }
}

pub fn read_notebook(path: &Path) -> Result<Notebook> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Write through a temp file in the target directory, then rename over the
/// destination. Readers see either the old or the new notebook.
fn write_notebook_atomic(path: &Path, notebook: &Notebook) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&tmp, notebook)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use comet::v1::{ActionDescriptor, ActionKind, Cell, DiffResult, Output};
    use std::fs;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, FsStore) {
        let temp = TempDir::new().unwrap();
        let store = FsStore::new(temp.path().join("comet_data"));
        (temp, store)
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 29, 10, 0, 0).unwrap()
    }

    fn sample() -> Notebook {
        Notebook::new(vec![
            Cell::markdown("# Title"),
            Cell::code("print('hi')").with_output(Output::stream("stdout", "hi\n")),
        ])
    }

    #[test]
    fn test_missing_canonical_reads_none() {
        let (_temp, store) = setup_store();
        assert!(store.read_canonical(&NotebookId::new("nb")).unwrap().is_none());
        assert!(!store.notebook_exists(&NotebookId::new("nb")));
    }

    #[test]
    fn test_canonical_roundtrip() {
        let (_temp, store) = setup_store();
        let id = NotebookId::new("nb");
        let path = store.write_canonical(&id, &sample()).unwrap();
        assert!(path.ends_with("nb/nb.ipynb"));
        assert_eq!(store.read_canonical(&id).unwrap(), Some(sample()));
        assert!(store.notebook_exists(&id));
    }

    #[test]
    fn test_canonical_overwrite() {
        let (_temp, store) = setup_store();
        let id = NotebookId::new("nb");
        store.write_canonical(&id, &sample()).unwrap();
        let next = Notebook::new(vec![Cell::code("x")]);
        store.write_canonical(&id, &next).unwrap();
        assert_eq!(store.read_canonical(&id).unwrap(), Some(next));
    }

    #[test]
    fn test_reads_nbformat_written_elsewhere() {
        let (_temp, store) = setup_store();
        let id = NotebookId::new("nb");
        let path = store.layout().canonical_file(&id).unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"cells": [{"cell_type": "code", "source": ["a = 1\n", "a"], "metadata": {},
                "execution_count": 1, "outputs": [{"output_type": "stream", "name": "stdout",
                "text": ["1\n"]}]}], "metadata": {}, "nbformat": 4, "nbformat_minor": 2}"#,
        )
        .unwrap();
        let nb = store.read_canonical(&id).unwrap().unwrap();
        assert_eq!(nb.cells[0].source.as_str(), "a = 1\na");
    }

    #[test]
    fn test_corrupt_canonical_is_an_error() {
        let (_temp, store) = setup_store();
        let id = NotebookId::new("nb");
        let path = store.layout().canonical_file(&id).unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not a notebook").unwrap();
        assert!(matches!(
            store.read_canonical(&id),
            Err(StoreError::Json(_))
        ));
    }

    #[test]
    fn test_versions_written_and_listed() {
        let (_temp, store) = setup_store();
        let id = NotebookId::new("nb");
        store.write_version(&id, &sample(), at()).unwrap();
        store
            .write_version(&id, &sample(), at() + Duration::minutes(2))
            .unwrap();
        // Same timestamp again replaces rather than duplicates.
        store.write_version(&id, &sample(), at()).unwrap();

        assert_eq!(store.list_versions(&id).unwrap().len(), 2);
        assert_eq!(
            store.latest_version(&id).unwrap(),
            Some(at() + Duration::minutes(2))
        );
        assert_eq!(store.read_version(&id, at()).unwrap(), sample());
    }

    #[test]
    fn test_read_missing_version() {
        let (_temp, store) = setup_store();
        let err = store
            .read_version(&NotebookId::new("nb"), at())
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionNotFound { .. }));
    }

    #[test]
    fn test_actions_roundtrip() {
        let (_temp, store) = setup_store();
        let id = NotebookId::new("nb");
        let action = ActionDescriptor::new(ActionKind::RunCell, 1, sample());
        store
            .append_action(&id, &LogEntry::new(&action, &DiffResult::new()))
            .unwrap();
        let entries = store.read_actions(&id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].index, 1);
    }

    #[test]
    fn test_read_actions_unknown_notebook() {
        let (_temp, store) = setup_store();
        let err = store.read_actions(&NotebookId::new("ghost")).unwrap_err();
        assert!(matches!(err, StoreError::NotebookNotFound(_)));
    }

    #[test]
    fn test_list_notebooks() {
        let (_temp, store) = setup_store();
        store.write_canonical(&NotebookId::new("b"), &sample()).unwrap();
        store.write_canonical(&NotebookId::new("a"), &sample()).unwrap();
        let ids = store.list_notebooks().unwrap();
        assert_eq!(ids, vec![NotebookId::new("a"), NotebookId::new("b")]);
    }
}
