use crate::{read_input, to_json};
use anyhow::{Context, Result};
use comet::v1::{ActionDescriptor, DiffResult, Notebook, compute_diff, documents_equal};
use similar::TextDiff;
use std::path::Path;

fn load_notebook(path: &Path) -> Result<Notebook> {
    comet_store::read_notebook(path).with_context(|| format!("Failed to read {:?}", path))
}

pub fn run_diff(prior: &Path, input: Option<&Path>, patch: bool, pretty: bool) -> Result<()> {
    let prior = load_notebook(prior)?;
    let content = read_input(input)?;
    let action =
        ActionDescriptor::from_json(&content).context("failed to parse action descriptor")?;

    let diff = compute_diff(&action, Some(&prior));
    println!("{}", to_json(&diff, pretty)?);
    if patch {
        print!("{}", source_patches(&prior, &diff));
    }
    Ok(())
}

/// Unified diffs of the source of every changed cell, against the cell at
/// the same index in `prior` (empty if there was none).
fn source_patches(prior: &Notebook, diff: &DiffResult) -> String {
    let mut out = String::new();
    for (index, cell) in diff.iter() {
        let old = prior.cell(index).map(|c| c.source.as_str()).unwrap_or("");
        let text = TextDiff::from_lines(old, cell.source.as_str());
        let unified = text
            .unified_diff()
            .context_radius(3)
            .header(&format!("prior/{}", index), &format!("current/{}", index))
            .to_string();
        if unified.is_empty() {
            // Changed outputs or cell type only.
            out.push_str(&format!("# cell {}: source unchanged\n", index));
        } else {
            out.push_str(&unified);
        }
    }
    out
}

/// Whether two notebook files are equal, cell by cell.
pub fn run_same(a: &Path, b: &Path, ignore_outputs: bool) -> Result<bool> {
    let equal = documents_equal(&load_notebook(a)?, &load_notebook(b)?, !ignore_outputs);
    println!("{}", if equal { "same" } else { "different" });
    Ok(equal)
}
