//! Cell and output equality.
//!
//! Equality here is deliberately narrower than structural equality: cell
//! metadata, execution counts and error tracebacks never count as changes.

use crate::types::{Cell, CellKind, Notebook, Output};

/// Does the cell at `index` differ between `prior` and `current`?
///
/// Rules, first match wins:
///
/// 1. `index` outside `current`: not comparable, returns `false`. Callers
///    skip such indices before asking.
/// 2. `index` outside `prior`: a new cell at the tail, differs.
/// 3. Cell kind or source text differ: differs.
/// 4. Outputs are only compared when `compare_outputs` is set and the cell
///    is a code cell (see [`outputs_differ`]).
pub fn cells_differ(
    prior: &Notebook,
    current: &Notebook,
    index: usize,
    compare_outputs: bool,
) -> bool {
    let Some(current_cell) = current.cell(index) else {
        return false;
    };
    match prior.cell(index) {
        None => true,
        Some(prior_cell) => cell_differs(prior_cell, current_cell, compare_outputs),
    }
}

/// Compare two cells that sit at the same position.
pub fn cell_differs(prior: &Cell, current: &Cell, compare_outputs: bool) -> bool {
    if prior.kind() != current.kind() {
        return true;
    }
    if prior.source != current.source {
        return true;
    }
    if !compare_outputs || current.kind() != CellKind::Code {
        return false;
    }
    outputs_differ(prior.outputs(), current.outputs())
}

/// Output sequences differ if their lengths differ or any position differs
/// (see [`output_differs`]).
pub fn outputs_differ(prior: &[Output], current: &[Output]) -> bool {
    prior.len() != current.len()
        || prior
            .iter()
            .zip(current)
            .any(|(p, c)| output_differs(p, c))
}

/// Two outputs at the same position differ when their `output_type` tags
/// differ, or when the payload field that matters for that type differs:
/// stream `text`, display/execute `data`, error `evalue`. Any other pairing
/// with matching tags is equal.
pub fn output_differs(prior: &Output, current: &Output) -> bool {
    if prior.output_type() != current.output_type() {
        return true;
    }
    match (prior, current) {
        (Output::Stream { text: a, .. }, Output::Stream { text: b, .. }) => a != b,
        (Output::DisplayData { data: a, .. }, Output::DisplayData { data: b, .. })
        | (Output::ExecuteResult { data: a, .. }, Output::ExecuteResult { data: b, .. }) => a != b,
        (Output::Error { evalue: a, .. }, Output::Error { evalue: b, .. }) => a != b,
        _ => false,
    }
}

/// Whole-notebook equality under the same rules as [`cells_differ`], applied
/// to every position. Notebooks of different length are never equal.
///
/// # Examples
///
/// ```
/// use comet::v1::{Cell, Notebook, Output, documents_equal};
///
/// let a = Notebook::new(vec![Cell::code("print(1)").with_output(Output::stream("stdout", "1\n"))]);
/// let b = Notebook::new(vec![Cell::code("print(1)")]);
///
/// assert!(documents_equal(&a, &b, false));
/// assert!(!documents_equal(&a, &b, true));
/// ```
pub fn documents_equal(a: &Notebook, b: &Notebook, compare_outputs: bool) -> bool {
    a.len() == b.len()
        && a.cells
            .iter()
            .zip(&b.cells)
            .all(|(x, y)| !cell_differs(x, y, compare_outputs))
}
