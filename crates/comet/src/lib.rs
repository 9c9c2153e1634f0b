#![doc = include_str!("../README.md")]

mod action;
mod compare;
mod diff;
mod error;
mod policy;
mod recorder;
mod types;

pub mod v1 {
    //! Versioned public API for comet types and operations.
    //!
    //! Everything you need is re-exported from this module. It is organized
    //! into four groups:
    //!
    //! # Notebook model
    //!
    //! - [`Notebook`]: an nbformat v4 notebook, compared cell by cell
    //! - [`Cell`] / [`CellKind`]: one code, markdown or raw cell
    //! - [`Output`] / [`MimeBundle`]: execution results of a code cell
    //! - [`Text`]: source or stream text, joined from nbformat line lists
    //!
    //! # Actions and diffs
    //!
    //! - [`ActionDescriptor`]: one editor action plus the whole current notebook
    //! - [`ActionKind`]: the closed set of action labels
    //! - [`candidate_indices`]: which cells an action could have touched
    //! - [`cells_differ`], [`documents_equal`]: comparison rules
    //! - [`compute_diff`]: the cells an action actually changed ([`DiffResult`])
    //!
    //! # Snapshot policy
    //!
    //! - [`SnapshotPolicy`] / [`decide`]: canonical and version write gating
    //! - [`SnapshotState`]: per-notebook throttle state
    //!
    //! # Recording
    //!
    //! - [`Recorder`]: serialised per-notebook processing over the
    //!   [`SnapshotStore`] and [`ActionLog`] collaborators
    //!
    //! # Example: diff a run against the stored notebook
    //!
    //! ```
    //! use comet::v1::*;
    //!
    //! let stored = Notebook::new(vec![Cell::markdown("# Analysis"), Cell::code("print(1)")]);
    //! let current = Notebook::new(vec![
    //!     Cell::markdown("# Analysis"),
    //!     Cell::code("print(1)").with_output(Output::stream("stdout", "1\n")),
    //! ]);
    //!
    //! let action = ActionDescriptor::new(ActionKind::RunCell, 1, current);
    //! let diff = compute_diff(&action, Some(&stored));
    //! assert_eq!(diff.indices(), vec![1]);
    //!
    //! let json = serde_json::to_string(&diff).unwrap();
    //! assert!(json.contains("\"1\""));
    //! ```
    pub use crate::action::{ActionKind, candidate_indices};
    pub use crate::compare::{
        cell_differs, cells_differ, documents_equal, output_differs, outputs_differ,
    };
    pub use crate::diff::{compute_diff, undo_deletion_diff};
    pub use crate::error::{CometError, Result};
    pub use crate::policy::{SnapshotDecision, SnapshotPolicy, SnapshotState, decide};
    pub use crate::recorder::{ActionLog, RecordOutcome, Recorder, SnapshotStore};
    pub use crate::types::{
        ActionDescriptor, Cell, CellKind, DiffResult, LogEntry, MimeBundle, Notebook, NotebookId,
        Output, Text,
    };
}
