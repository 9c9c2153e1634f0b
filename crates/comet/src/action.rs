//! Action kinds and the index resolver.
//!
//! Every action the notebook front end reports maps to a closed set of cell
//! indices it could have touched. The mapping is a single table in
//! [`candidate_indices`]; there is no catch-all "compare everything" arm.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Editor action labels, as sent in the `name` field of an action.
///
/// Labels the front end may send that are not listed here parse into
/// [`ActionKind::Unrecognized`], which resolves to no candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    RunCell,
    RunCellAndInsertBelow,
    RunCellAndSelectNext,
    RunAllCells,
    RunAllCellsAbove,
    RunAllCellsBelow,
    RestartKernelAndClearOutput,
    ConfirmRestartKernelAndRunAllCells,
    InsertCellAbove,
    InsertCellBelow,
    MergeCellWithNextCell,
    MergeCellWithPreviousCell,
    MergeSelectedCells,
    MergeCells,
    SplitCellAtCursor,
    MoveCellUp,
    MoveCellDown,
    ChangeCellToMarkdown,
    ChangeCellToCode,
    ChangeCellToRaw,
    ClearCellOutput,
    ToggleCellOutputCollapsed,
    ToggleCellOutputScrolled,
    CopyCell,
    CutCell,
    PasteCellAbove,
    PasteCellBelow,
    PasteCellReplace,
    DeleteCell,
    UndoCellDeletion,
    SelectCell,
    UnselectCell,
    Unrecognized(String),
}

impl ActionKind {
    /// Every recognised kind, in table order.
    pub const KNOWN: &'static [ActionKind] = &[
        ActionKind::RunCell,
        ActionKind::RunCellAndInsertBelow,
        ActionKind::RunCellAndSelectNext,
        ActionKind::RunAllCells,
        ActionKind::RunAllCellsAbove,
        ActionKind::RunAllCellsBelow,
        ActionKind::RestartKernelAndClearOutput,
        ActionKind::ConfirmRestartKernelAndRunAllCells,
        ActionKind::InsertCellAbove,
        ActionKind::InsertCellBelow,
        ActionKind::MergeCellWithNextCell,
        ActionKind::MergeCellWithPreviousCell,
        ActionKind::MergeSelectedCells,
        ActionKind::MergeCells,
        ActionKind::SplitCellAtCursor,
        ActionKind::MoveCellUp,
        ActionKind::MoveCellDown,
        ActionKind::ChangeCellToMarkdown,
        ActionKind::ChangeCellToCode,
        ActionKind::ChangeCellToRaw,
        ActionKind::ClearCellOutput,
        ActionKind::ToggleCellOutputCollapsed,
        ActionKind::ToggleCellOutputScrolled,
        ActionKind::CopyCell,
        ActionKind::CutCell,
        ActionKind::PasteCellAbove,
        ActionKind::PasteCellBelow,
        ActionKind::PasteCellReplace,
        ActionKind::DeleteCell,
        ActionKind::UndoCellDeletion,
        ActionKind::SelectCell,
        ActionKind::UnselectCell,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::RunCell => "run-cell",
            ActionKind::RunCellAndInsertBelow => "run-cell-and-insert-below",
            ActionKind::RunCellAndSelectNext => "run-cell-and-select-next",
            ActionKind::RunAllCells => "run-all-cells",
            ActionKind::RunAllCellsAbove => "run-all-cells-above",
            ActionKind::RunAllCellsBelow => "run-all-cells-below",
            ActionKind::RestartKernelAndClearOutput => "restart-kernel-and-clear-output",
            ActionKind::ConfirmRestartKernelAndRunAllCells => {
                "confirm-restart-kernel-and-run-all-cells"
            }
            ActionKind::InsertCellAbove => "insert-cell-above",
            ActionKind::InsertCellBelow => "insert-cell-below",
            ActionKind::MergeCellWithNextCell => "merge-cell-with-next-cell",
            ActionKind::MergeCellWithPreviousCell => "merge-cell-with-previous-cell",
            ActionKind::MergeSelectedCells => "merge-selected-cells",
            ActionKind::MergeCells => "merge-cells",
            ActionKind::SplitCellAtCursor => "split-cell-at-cursor",
            ActionKind::MoveCellUp => "move-cell-up",
            ActionKind::MoveCellDown => "move-cell-down",
            ActionKind::ChangeCellToMarkdown => "change-cell-to-markdown",
            ActionKind::ChangeCellToCode => "change-cell-to-code",
            ActionKind::ChangeCellToRaw => "change-cell-to-raw",
            ActionKind::ClearCellOutput => "clear-cell-output",
            ActionKind::ToggleCellOutputCollapsed => "toggle-cell-output-collapsed",
            ActionKind::ToggleCellOutputScrolled => "toggle-cell-output-scrolled",
            ActionKind::CopyCell => "copy-cell",
            ActionKind::CutCell => "cut-cell",
            ActionKind::PasteCellAbove => "paste-cell-above",
            ActionKind::PasteCellBelow => "paste-cell-below",
            ActionKind::PasteCellReplace => "paste-cell-replace",
            ActionKind::DeleteCell => "delete-cell",
            ActionKind::UndoCellDeletion => "undo-cell-deletion",
            ActionKind::SelectCell => "select-cell",
            ActionKind::UnselectCell => "unselect-cell",
            ActionKind::Unrecognized(name) => name,
        }
    }

    /// Clipboard actions. Their diff is whatever was selected or inserted,
    /// copied straight from the current notebook without comparison.
    pub fn is_clipboard(&self) -> bool {
        matches!(
            self,
            ActionKind::CutCell
                | ActionKind::CopyCell
                | ActionKind::PasteCellAbove
                | ActionKind::PasteCellBelow
                | ActionKind::PasteCellReplace
        )
    }

    /// Actions that execute one or more cells.
    pub fn executes_cells(&self) -> bool {
        matches!(
            self,
            ActionKind::RunCell
                | ActionKind::RunCellAndInsertBelow
                | ActionKind::RunCellAndSelectNext
                | ActionKind::RunAllCells
                | ActionKind::RunAllCellsAbove
                | ActionKind::RunAllCellsBelow
                | ActionKind::ConfirmRestartKernelAndRunAllCells
        )
    }

    /// Actions that remove cells from the notebook.
    pub fn deletes_cells(&self) -> bool {
        matches!(self, ActionKind::DeleteCell | ActionKind::CutCell)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ActionKind::KNOWN
            .iter()
            .find(|kind| kind.as_str() == s)
            .cloned()
            .unwrap_or_else(|| ActionKind::Unrecognized(s.to_string())))
    }
}

impl From<String> for ActionKind {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Unrecognized(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// Cell indices an action of `kind` could have affected.
///
/// `current_len` and `prior_len` are the cell counts of the notebook sent with
/// the action and of the last stored snapshot. The arithmetic is signed and
/// saturating; only indices inside the current notebook are returned, so any
/// `selected_index` is safe, however far out of range.
///
/// # Examples
///
/// ```
/// use comet::v1::{ActionKind, candidate_indices};
///
/// assert_eq!(candidate_indices(&ActionKind::RunAllCells, 0, &[0], 5, 5), vec![0, 1, 2, 3, 4]);
/// assert_eq!(candidate_indices(&ActionKind::InsertCellBelow, 1, &[1], 4, 3), vec![2]);
/// assert!(candidate_indices(&ActionKind::MoveCellUp, 0, &[0], 3, 3).is_empty());
/// ```
pub fn candidate_indices(
    kind: &ActionKind,
    selected_index: i64,
    selected_indices: &[i64],
    current_len: usize,
    prior_len: usize,
) -> Vec<usize> {
    let s = selected_index;
    let current = as_signed(current_len);
    let inserted = current - as_signed(prior_len);
    let first = selected_indices.first().copied();
    let last = selected_indices.last().copied();
    // Cells in [lo, hi) that exist in the current notebook.
    let within = |lo: i64, hi: i64| -> Vec<i64> { (lo.max(0)..hi.min(current)).collect() };
    let span = |start: i64, len: i64| within(start, start.saturating_add(len.max(0)));

    let raw: Vec<i64> = match kind {
        ActionKind::RunCell
        | ActionKind::InsertCellAbove
        | ActionKind::MergeCellWithNextCell
        | ActionKind::UnselectCell
        | ActionKind::ClearCellOutput
        | ActionKind::ChangeCellToMarkdown
        | ActionKind::ChangeCellToCode
        | ActionKind::ChangeCellToRaw
        | ActionKind::ToggleCellOutputCollapsed
        | ActionKind::ToggleCellOutputScrolled => vec![s],

        ActionKind::InsertCellBelow => vec![s.saturating_add(1)],

        ActionKind::PasteCellAbove => first.map(|f| span(f, inserted)).unwrap_or_default(),
        ActionKind::PasteCellBelow => last
            .map(|l| span(l.saturating_add(1), inserted))
            .unwrap_or_default(),
        ActionKind::PasteCellReplace => first
            .map(|f| span(f, inserted.saturating_add(as_signed(selected_indices.len()))))
            .unwrap_or_default(),

        ActionKind::RunCellAndInsertBelow
        | ActionKind::RunCellAndSelectNext
        | ActionKind::SplitCellAtCursor => vec![s, s.saturating_add(1)],

        ActionKind::MoveCellDown => {
            if s < current - 1 {
                vec![s, s.saturating_add(1)]
            } else {
                Vec::new()
            }
        }
        ActionKind::MoveCellUp => {
            if s == 0 {
                Vec::new()
            } else {
                vec![s, s.saturating_sub(1)]
            }
        }

        ActionKind::RunAllCells
        | ActionKind::RestartKernelAndClearOutput
        | ActionKind::ConfirmRestartKernelAndRunAllCells
        | ActionKind::UndoCellDeletion => within(0, current),
        ActionKind::RunAllCellsAbove => within(0, s),
        ActionKind::RunAllCellsBelow => within(s, current),

        ActionKind::MergeCellWithPreviousCell => vec![s.saturating_sub(1).max(0)],
        // A single index, the lowest selected one.
        ActionKind::MergeSelectedCells | ActionKind::MergeCells => {
            selected_indices.iter().min().map(|m| vec![*m]).unwrap_or_default()
        }

        ActionKind::CopyCell => selected_indices.to_vec(),

        ActionKind::DeleteCell
        | ActionKind::CutCell
        | ActionKind::SelectCell
        | ActionKind::Unrecognized(_) => Vec::new(),
    };

    raw.into_iter()
        .filter(|i| (0..current).contains(i))
        .filter_map(|i| usize::try_from(i).ok())
        .collect()
}

fn as_signed(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}
