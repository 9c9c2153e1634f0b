//! Implementation of the `comet` collaborator traits for [`FsStore`].

use crate::io::FsStore;
use chrono::{DateTime, Utc};
use comet::v1::{ActionLog, CometError, LogEntry, Notebook, NotebookId, SnapshotStore};

impl SnapshotStore for FsStore {
    fn read_prior(&self, id: &NotebookId) -> comet::v1::Result<Option<Notebook>> {
        self.read_canonical(id).map_err(CometError::storage)
    }

    fn write_canonical(&self, id: &NotebookId, notebook: &Notebook) -> comet::v1::Result<()> {
        FsStore::write_canonical(self, id, notebook)
            .map(drop)
            .map_err(CometError::storage)
    }

    fn write_version(
        &self,
        id: &NotebookId,
        notebook: &Notebook,
        at: DateTime<Utc>,
    ) -> comet::v1::Result<()> {
        FsStore::write_version(self, id, notebook, at)
            .map(drop)
            .map_err(CometError::storage)
    }

    fn latest_version(&self, id: &NotebookId) -> comet::v1::Result<Option<DateTime<Utc>>> {
        FsStore::latest_version(self, id).map_err(CometError::storage)
    }
}

impl ActionLog for FsStore {
    fn append(&self, id: &NotebookId, entry: &LogEntry) -> comet::v1::Result<()> {
        self.append_action(id, entry).map_err(CometError::storage)
    }
}
