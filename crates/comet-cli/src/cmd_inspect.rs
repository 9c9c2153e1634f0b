use crate::{load_config, notebook_id, to_json};
use anyhow::{Context, Result};
use comet_store::{FsStore, UsageSummary, VERSION_TIME_FORMAT, summarize};
use std::path::Path;

fn open_store(data_dir: Option<&Path>) -> Result<FsStore> {
    let config = load_config(data_dir, None)?;
    Ok(FsStore::new(config.data_directory))
}

pub fn run_log(notebook: &str, data_dir: Option<&Path>, pretty: bool) -> Result<()> {
    let id = notebook_id(notebook)?;
    let entries = open_store(data_dir)?
        .read_actions(&id)
        .with_context(|| format!("failed to read action log of {}", id))?;
    println!("{}", to_json(&entries, pretty)?);
    Ok(())
}

pub fn run_list(data_dir: Option<&Path>) -> Result<()> {
    let store = open_store(data_dir)?;
    let ids = store.list_notebooks().with_context(|| {
        format!(
            "failed to list notebooks in {}",
            store.layout().data_dir().display()
        )
    })?;
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}

pub fn run_versions(notebook: &str, data_dir: Option<&Path>) -> Result<()> {
    let id = notebook_id(notebook)?;
    for at in open_store(data_dir)?.list_versions(&id)? {
        println!("{}", at.format(VERSION_TIME_FORMAT));
    }
    Ok(())
}

pub fn run_summary(notebook: &str, data_dir: Option<&Path>, json: bool, pretty: bool) -> Result<()> {
    let id = notebook_id(notebook)?;
    let summary = summarize(&open_store(data_dir)?, &id)
        .with_context(|| format!("failed to summarize {}", id))?;
    if json {
        println!("{}", to_json(&summary, pretty)?);
    } else {
        print!("{}", format_summary(&summary));
    }
    Ok(())
}

fn format_summary(summary: &UsageSummary) -> String {
    let mut out = format!("{}\n", summary.name);
    out.push_str(&format!("  actions:     {}\n", summary.actions));
    out.push_str(&format!("  runs:        {}\n", summary.runs));
    out.push_str(&format!("  deletions:   {}\n", summary.deletions));
    out.push_str(&format!(
        "  active time: {}\n",
        format_duration(summary.active_seconds)
    ));
    out.push_str(&format!("  versions:    {}\n", summary.versions.len()));
    for version in &summary.versions {
        let cells: Vec<&str> = version.cells.iter().map(|c| c.as_str()).collect();
        out.push_str(&format!(
            "    {}  {}\n",
            version.at.format("%Y-%m-%d %H:%M:%S"),
            cells.join(" ")
        ));
    }
    out
}

fn format_duration(secs: i64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {}m {}s", h, m, s)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use comet::v1::{ActionDescriptor, ActionKind, Cell, DiffResult, LogEntry, Notebook, NotebookId};
    use comet_store::{CellDisplay, VersionStrip};
    use tempfile::TempDir;

    fn populated() -> TempDir {
        let temp = TempDir::new().unwrap();
        let store = FsStore::new(temp.path());
        let id = NotebookId::new("analysis");
        let nb = Notebook::new(vec![Cell::markdown("# t"), Cell::code("x")]);
        store.write_canonical(&id, &nb).unwrap();
        store
            .write_version(&id, &nb, Utc.with_ymd_and_hms(2026, 3, 29, 10, 0, 0).unwrap())
            .unwrap();
        let action = ActionDescriptor::new(ActionKind::RunCell, 1, nb).with_time(1_000);
        store
            .append_action(&id, &LogEntry::new(&action, &DiffResult::new()))
            .unwrap();
        temp
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(75), "1m 15s");
        assert_eq!(format_duration(3_661), "1h 1m 1s");
    }

    #[test]
    fn test_format_summary() {
        let summary = UsageSummary {
            name: NotebookId::new("analysis"),
            actions: 3,
            runs: 2,
            deletions: 1,
            active_seconds: 90,
            versions: vec![VersionStrip {
                at: Utc.with_ymd_and_hms(2026, 3, 29, 10, 0, 0).unwrap(),
                cells: vec![CellDisplay::Markdown, CellDisplay::Error],
            }],
        };
        let text = format_summary(&summary);
        assert!(text.starts_with("analysis\n"));
        assert!(text.contains("runs:        2"));
        assert!(text.contains("active time: 1m 30s"));
        assert!(text.contains("2026-03-29 10:00:00  markdown error"));
    }

    #[test]
    fn test_inspect_commands() {
        let temp = populated();
        let dir = Some(temp.path());
        assert!(run_log("analysis", dir, false).is_ok());
        assert!(run_list(dir).is_ok());
        assert!(run_versions("analysis.ipynb", dir).is_ok());
        assert!(run_summary("analysis", dir, false, false).is_ok());
        assert!(run_summary("analysis", dir, true, true).is_ok());
    }

    #[test]
    fn test_unknown_notebook_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(run_log("ghost", Some(temp.path()), false).is_err());
        assert!(run_summary("ghost", Some(temp.path()), false, false).is_err());
    }
}
