#![doc = include_str!("../README.md")]

use chrono::{DateTime, Utc};
use git2::{Commit, ErrorCode, Oid, Repository, Signature, Time};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const AUTHOR_NAME: &str = "comet";
pub const AUTHOR_EMAIL: &str = "comet@localhost";

pub type Result<T> = std::result::Result<T, VcsError>;

#[derive(Debug, Error)]
pub enum VcsError {
    /// One commit failed. The snapshot on disk is unaffected.
    #[error("Snapshot commit failed: {0}")]
    Recoverable(#[from] git2::Error),

    /// The repository could not be opened or created.
    #[error("Cannot open snapshot repository at {path}: {source}")]
    Fatal {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },
}

impl VcsError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, VcsError::Recoverable(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed(Oid),
    /// The staged tree matches `HEAD`; nothing was committed.
    Unchanged,
}

/// A git repository holding one notebook's canonical snapshot.
pub struct SnapshotRepo {
    repo: Repository,
}

impl SnapshotRepo {
    /// Open the repository rooted at `dir`, initialising it (and creating
    /// `dir`) if there is none. Repositories in parent directories are not
    /// picked up.
    pub fn open_or_init<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let fatal = |source| VcsError::Fatal {
            path: dir.to_path_buf(),
            source,
        };
        let repo = match Repository::open(dir) {
            Ok(repo) => repo,
            Err(e) if e.code() == ErrorCode::NotFound => {
                tracing::info!(dir = %dir.display(), "initialising snapshot repository");
                Repository::init(dir).map_err(fatal)?
            }
            Err(e) => return Err(fatal(e)),
        };
        if repo.is_bare() {
            return Err(fatal(git2::Error::from_str("repository is bare")));
        }
        Ok(Self { repo })
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Stage `file_name` (relative to the work tree) and commit it on top of
    /// `HEAD`, authored by `comet <comet@localhost>` at `time`.
    pub fn commit_snapshot(
        &self,
        file_name: &str,
        message: &str,
        time: DateTime<Utc>,
    ) -> Result<CommitOutcome> {
        let mut index = self.repo.index()?;
        index.add_path(Path::new(file_name))?;
        index.write()?;
        let tree_id = index.write_tree()?;

        let parent = self.head_commit()?;
        if let Some(parent) = &parent
            && parent.tree_id() == tree_id
        {
            tracing::debug!(file = file_name, "snapshot unchanged, no commit");
            return Ok(CommitOutcome::Unchanged);
        }

        let tree = self.repo.find_tree(tree_id)?;
        let sig = Signature::new(AUTHOR_NAME, AUTHOR_EMAIL, &Time::new(time.timestamp(), 0))?;
        let parents: Vec<&Commit> = parent.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;

        tracing::debug!(file = file_name, commit = %oid, "committed snapshot");
        Ok(CommitOutcome::Committed(oid))
    }

    fn head_commit(&self) -> Result<Option<Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
