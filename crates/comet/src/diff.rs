//! Per-action diff against the last stored notebook.

use crate::action::{ActionKind, candidate_indices};
use crate::compare::cells_differ;
use crate::types::{ActionDescriptor, DiffResult, Notebook};

/// Work out which cells `action` changed relative to `prior`.
///
/// - No prior notebook: empty result. There is nothing to diff against and
///   the caller bootstraps a full snapshot instead.
/// - Clipboard actions: the resolved cells are copied from the current
///   notebook as-is.
/// - `undo-cell-deletion`: the re-inserted block, see
///   [`undo_deletion_diff`].
/// - Everything else: each resolved index inside the current notebook is
///   compared, outputs included, and kept if it differs.
///
/// Indices outside the current notebook are never emitted.
///
/// # Examples
///
/// ```
/// use comet::v1::{ActionDescriptor, ActionKind, Cell, Notebook, compute_diff};
///
/// let prior = Notebook::new(vec![Cell::code("a"), Cell::code("b"), Cell::code("c")]);
/// let current = Notebook::new(vec![
///     Cell::code("a"),
///     Cell::code("b"),
///     Cell::code(""),
///     Cell::code("c"),
/// ]);
/// let action = ActionDescriptor::new(ActionKind::InsertCellBelow, 1, current);
///
/// let diff = compute_diff(&action, Some(&prior));
/// assert_eq!(diff.indices(), vec![2]);
/// ```
pub fn compute_diff(action: &ActionDescriptor, prior: Option<&Notebook>) -> DiffResult {
    let Some(prior) = prior else {
        return DiffResult::new();
    };
    let current = &action.document;

    if action.kind == ActionKind::UndoCellDeletion {
        return undo_deletion_diff(prior, current);
    }

    let candidates = candidate_indices(
        &action.kind,
        action.selected_index,
        &action.selected_indices,
        current.len(),
        prior.len(),
    );

    let mut diff = DiffResult::new();
    for index in candidates {
        let Some(cell) = current.cell(index) else {
            continue;
        };
        if action.kind.is_clipboard() || cells_differ(prior, current, index, true) {
            diff.insert(index, cell.clone());
        }
    }
    diff
}

/// Undoing a deletion re-inserts a contiguous block at an unknown offset.
/// Everything after the block looks shifted, so only the block itself is
/// reported: it starts at the first index whose source no longer matches
/// the prior notebook (or that lies past its end) and spans as many cells as
/// the notebook grew by.
pub fn undo_deletion_diff(prior: &Notebook, current: &Notebook) -> DiffResult {
    let mut diff = DiffResult::new();
    let inserted = current.len().saturating_sub(prior.len());
    if inserted == 0 {
        return diff;
    }

    let first_divergence = current
        .cells
        .iter()
        .enumerate()
        .find(|(i, cell)| match prior.cell(*i) {
            None => true,
            Some(p) => p.source != cell.source,
        })
        .map(|(i, _)| i)
        .unwrap_or(prior.len());

    for (index, cell) in current
        .cells
        .iter()
        .enumerate()
        .skip(first_divergence)
        .take(inserted)
    {
        diff.insert(index, cell.clone());
    }
    diff
}
