//! Processing of one action end to end: read the stored notebook, diff,
//! log, and write whatever the snapshot policy allows.
//!
//! Storage and the action log are collaborators behind traits. The recorder
//! serialises all work for one notebook identity, because each action is a
//! read-then-decide-then-write sequence against that notebook's stored copy.

use crate::action::ActionKind;
use crate::compare::documents_equal;
use crate::diff::compute_diff;
use crate::error::Result;
use crate::policy::{SnapshotDecision, SnapshotPolicy, SnapshotState};
use crate::types::{ActionDescriptor, DiffResult, LogEntry, Notebook, NotebookId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// ── Collaborator traits ──────────────────────────────────────────────

/// Durable storage of notebook snapshots.
///
/// Implementations map their own failures to
/// [`CometError::Storage`](crate::error::CometError::Storage). Nothing is
/// retried by the recorder.
pub trait SnapshotStore {
    /// The current canonical snapshot, or `None` if the notebook has never
    /// been stored.
    fn read_prior(&self, id: &NotebookId) -> Result<Option<Notebook>>;

    /// Replace the canonical snapshot.
    fn write_canonical(&self, id: &NotebookId, notebook: &Notebook) -> Result<()>;

    /// Keep a point-in-time copy. Writing the same timestamp twice must be
    /// harmless.
    fn write_version(&self, id: &NotebookId, notebook: &Notebook, at: DateTime<Utc>)
    -> Result<()>;

    /// Timestamp of the newest stored version, if any.
    fn latest_version(&self, id: &NotebookId) -> Result<Option<DateTime<Utc>>>;
}

/// Append-only record of processed actions.
///
/// Entries are appended before any snapshot is written, so a caller that
/// retries after a failed write hands the same entry over again.
/// Implementations should drop an entry for which
/// [`LogEntry::same_action`] holds against the last one appended.
pub trait ActionLog {
    fn append(&self, id: &NotebookId, entry: &LogEntry) -> Result<()>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for &T {
    fn read_prior(&self, id: &NotebookId) -> Result<Option<Notebook>> {
        (**self).read_prior(id)
    }

    fn write_canonical(&self, id: &NotebookId, notebook: &Notebook) -> Result<()> {
        (**self).write_canonical(id, notebook)
    }

    fn write_version(
        &self,
        id: &NotebookId,
        notebook: &Notebook,
        at: DateTime<Utc>,
    ) -> Result<()> {
        (**self).write_version(id, notebook, at)
    }

    fn latest_version(&self, id: &NotebookId) -> Result<Option<DateTime<Utc>>> {
        (**self).latest_version(id)
    }
}

impl<T: ActionLog + ?Sized> ActionLog for &T {
    fn append(&self, id: &NotebookId, entry: &LogEntry) -> Result<()> {
        (**self).append(id, entry)
    }
}

// ── Recorder ─────────────────────────────────────────────────────────

/// What happened for one recorded action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordOutcome {
    /// True when no snapshot existed before this action.
    pub bootstrap: bool,
    pub diff: DiffResult,
    pub logged: bool,
    pub decision: SnapshotDecision,
}

pub struct Recorder<S, L> {
    store: S,
    log: L,
    policy: SnapshotPolicy,
    states: Mutex<HashMap<NotebookId, Arc<Mutex<SnapshotState>>>>,
}

impl<S: SnapshotStore, L: ActionLog> Recorder<S, L> {
    pub fn new(store: S, log: L) -> Self {
        Self {
            store,
            log,
            policy: SnapshotPolicy::default(),
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_policy(mut self, policy: SnapshotPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn policy(&self) -> &SnapshotPolicy {
        &self.policy
    }

    /// Process one action for notebook `id` at wall-clock time `now`.
    ///
    /// Calls for the same `id` run one at a time; different notebooks do not
    /// block each other beyond a brief registry lookup.
    ///
    /// The action is logged before any snapshot is written, so retrying after
    /// a failed write recomputes the same diff against the same stored copy.
    pub fn record(
        &self,
        id: &NotebookId,
        action: &ActionDescriptor,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome> {
        let state = self.state_for(id)?;
        let mut state = lock(&state);

        let prior = self.store.read_prior(id)?;
        let bootstrap = prior.is_none();
        let diff = compute_diff(action, prior.as_ref());
        tracing::debug!(
            notebook = %id,
            action = %action.kind,
            changed = ?diff.indices(),
            "computed action diff"
        );

        let logged = !(action.kind == ActionKind::UnselectCell && diff.is_empty());
        if logged {
            self.log.append(id, &LogEntry::new(action, &diff))?;
        }

        let decision = match &prior {
            Some(prior) if documents_equal(prior, &action.document, true) => SnapshotDecision::SKIP,
            _ => self
                .policy
                .decide(&diff, !bootstrap, state.last_version, now),
        };

        if decision.write_canonical {
            self.store.write_canonical(id, &action.document)?;
            tracing::info!(notebook = %id, cells = action.document.len(), "wrote canonical snapshot");
        }
        if decision.write_version {
            self.store.write_version(id, &action.document, now)?;
            state.version_written(now);
            tracing::info!(notebook = %id, at = %now, "wrote version snapshot");
        }

        Ok(RecordOutcome {
            bootstrap,
            diff,
            logged,
            decision,
        })
    }

    /// Throttle state for `id`, seeded from storage the first time the
    /// notebook is seen.
    fn state_for(&self, id: &NotebookId) -> Result<Arc<Mutex<SnapshotState>>> {
        if let Some(state) = lock(&self.states).get(id) {
            return Ok(Arc::clone(state));
        }
        let last_version = self.store.latest_version(id)?;
        let mut states = lock(&self.states);
        let state = states
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(SnapshotState::new(id.clone(), last_version))));
        Ok(Arc::clone(state))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
