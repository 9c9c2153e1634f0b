//! Usage summary of one stored notebook: how much it was run, edited and
//! pruned, and what its cells looked like at every version.

use crate::error::{Result, StoreError};
use crate::io::FsStore;
use chrono::{DateTime, Utc};
use comet::v1::{Cell, CellKind, LogEntry, NotebookId, Output};
use serde::Serialize;

/// Gaps between consecutive actions longer than this are idle time.
pub const IDLE_GAP_MS: i64 = 5 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSummary {
    pub name: NotebookId,
    pub actions: usize,
    pub runs: usize,
    pub deletions: usize,
    pub active_seconds: i64,
    pub versions: Vec<VersionStrip>,
}

/// One version file rendered as the display kind of each cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionStrip {
    pub at: DateTime<Utc>,
    pub cells: Vec<CellDisplay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellDisplay {
    Markdown,
    Raw,
    Code,
    Stream,
    ExecuteResult,
    DisplayData,
    Error,
}

impl CellDisplay {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellDisplay::Markdown => "markdown",
            CellDisplay::Raw => "raw",
            CellDisplay::Code => "code",
            CellDisplay::Stream => "stream",
            CellDisplay::ExecuteResult => "execute_result",
            CellDisplay::DisplayData => "display_data",
            CellDisplay::Error => "error",
        }
    }

    fn priority(&self) -> u8 {
        match self {
            CellDisplay::Error => 4,
            CellDisplay::DisplayData => 3,
            CellDisplay::ExecuteResult => 2,
            CellDisplay::Stream => 1,
            _ => 0,
        }
    }
}

impl std::fmt::Display for CellDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a cell shows up in a version strip. Code cells take the kind of their
/// most prominent output; unknown output types do not count.
pub fn cell_display(cell: &Cell) -> CellDisplay {
    match cell.kind() {
        CellKind::Markdown => CellDisplay::Markdown,
        CellKind::Raw => CellDisplay::Raw,
        CellKind::Code => cell
            .outputs()
            .iter()
            .filter_map(|output| match output {
                Output::Stream { .. } => Some(CellDisplay::Stream),
                Output::ExecuteResult { .. } => Some(CellDisplay::ExecuteResult),
                Output::DisplayData { .. } => Some(CellDisplay::DisplayData),
                Output::Error { .. } => Some(CellDisplay::Error),
                Output::Other(_) => None,
            })
            .max_by_key(CellDisplay::priority)
            .unwrap_or(CellDisplay::Code),
    }
}

/// Sum of gaps between consecutive action times (milliseconds), leaving out
/// gaps longer than [`IDLE_GAP_MS`]. Times are taken in log order.
pub fn active_time_ms(times: &[i64]) -> i64 {
    times
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|gap| (0..=IDLE_GAP_MS).contains(gap))
        .sum()
}

pub fn summarize(store: &FsStore, id: &NotebookId) -> Result<UsageSummary> {
    if !store.notebook_exists(id) {
        return Err(StoreError::NotebookNotFound(id.to_string()));
    }
    let entries = store.read_actions(id)?;
    let times: Vec<i64> = entries.iter().map(|e| e.time).collect();

    let mut versions = Vec::new();
    for at in store.list_versions(id)? {
        let notebook = store.read_version(id, at)?;
        versions.push(VersionStrip {
            at,
            cells: notebook.cells.iter().map(cell_display).collect(),
        });
    }

    Ok(UsageSummary {
        name: id.clone(),
        actions: entries.len(),
        runs: count(&entries, |e| e.name.executes_cells()),
        deletions: count(&entries, |e| e.name.deletes_cells()),
        active_seconds: active_time_ms(&times) / 1000,
        versions,
    })
}

fn count(entries: &[LogEntry], pred: impl Fn(&LogEntry) -> bool) -> usize {
    entries.iter().filter(|e| pred(e)).count()
}
