use crate::{load_config, notebook_id, read_input, to_json};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use comet::v1::{
    ActionDescriptor, ActionKind, NotebookId, RecordOutcome, Recorder, SnapshotPolicy,
};
use comet_git::{CommitOutcome, SnapshotRepo};
use comet_store::FsStore;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Notebook the actions belong to; its file name is the identity
    #[arg(short, long)]
    pub notebook: PathBuf,

    /// Input file (default: stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Minimum seconds between two version copies
    #[arg(long)]
    pub version_interval: Option<u64>,

    /// Processing time (RFC 3339) instead of the clock. Replay uses each
    /// action's own time when it has one.
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

/// A recorder bound to one notebook, plus the git hook that runs after each
/// canonical write.
struct Session {
    id: NotebookId,
    recorder: Recorder<FsStore, FsStore>,
    git: bool,
}

impl Session {
    fn open(args: &RecordArgs, git: bool, data_dir: Option<&Path>) -> Result<Self> {
        let config = load_config(data_dir, args.version_interval)?;
        let id = notebook_id(&args.notebook.to_string_lossy())?;
        let store = FsStore::new(&config.data_directory);
        let recorder = Recorder::new(store.clone(), store)
            .with_policy(SnapshotPolicy::new(config.version_interval));
        Ok(Self { id, recorder, git })
    }

    fn record(&self, action: &ActionDescriptor, now: DateTime<Utc>) -> Result<RecordOutcome> {
        let outcome = self
            .recorder
            .record(&self.id, action, now)
            .with_context(|| format!("failed to record {} for {}", action.kind, self.id))?;
        if self.git && outcome.decision.write_canonical {
            commit_canonical(self.recorder.store(), &self.id, &action.kind, now)?;
        }
        Ok(outcome)
    }
}

/// Commit the canonical snapshot. A failed commit is logged and recording
/// goes on; a repository that cannot be opened stops the command.
fn commit_canonical(
    store: &FsStore,
    id: &NotebookId,
    kind: &ActionKind,
    at: DateTime<Utc>,
) -> Result<()> {
    let dir = store.layout().notebook_dir(id)?;
    let canonical = store.layout().canonical_file(id)?;
    let file_name = canonical
        .file_name()
        .and_then(|name| name.to_str())
        .context("canonical snapshot has no file name")?;

    let repo = SnapshotRepo::open_or_init(&dir)?;
    match repo.commit_snapshot(file_name, kind.as_str(), at) {
        Ok(CommitOutcome::Committed(oid)) => {
            tracing::info!(notebook = %id, commit = %oid, "committed snapshot");
        }
        Ok(CommitOutcome::Unchanged) => {}
        Err(e) if e.is_recoverable() => {
            tracing::warn!(notebook = %id, error = %e, "snapshot commit failed");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

pub fn run_record(
    args: RecordArgs,
    git: bool,
    data_dir: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let session = Session::open(&args, git, data_dir)?;
    let content = read_input(args.input.as_deref())?;
    let action =
        ActionDescriptor::from_json(&content).context("failed to parse action descriptor")?;
    let outcome = session.record(&action, args.at.unwrap_or_else(Utc::now))?;
    println!("{}", to_json(&outcome, pretty)?);
    Ok(())
}

// ============================================================================
// Replay
// ============================================================================

#[derive(Debug, Default, Serialize)]
struct ReplayReport {
    processed: usize,
    skipped: usize,
    outcomes: Vec<ReplayLine>,
    errors: Vec<ReplayError>,
}

#[derive(Debug, Serialize)]
struct ReplayLine {
    line: usize,
    name: ActionKind,
    changed: Vec<usize>,
    canonical: bool,
    version: bool,
}

#[derive(Debug, Serialize)]
struct ReplayError {
    line: usize,
    error: String,
}

pub fn run_replay(
    args: RecordArgs,
    git: bool,
    data_dir: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let session = Session::open(&args, git, data_dir)?;
    let content = read_input(args.input.as_deref())?;
    let fallback = args.at;
    let report = replay(&session, &content, || fallback.unwrap_or_else(Utc::now))?;
    println!("{}", to_json(&report, pretty)?);
    Ok(())
}

/// Feed every line through the session in order. Lines that do not parse are
/// reported and skipped; a storage failure ends the replay.
fn replay(
    session: &Session,
    content: &str,
    fallback_now: impl Fn() -> DateTime<Utc>,
) -> Result<ReplayReport> {
    let mut report = ReplayReport::default();
    for (i, line) in content.lines().enumerate() {
        let line_num = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        let action = match ActionDescriptor::from_json(line) {
            Ok(action) => action,
            Err(e) => {
                tracing::warn!(line = line_num, error = %e, "skipping malformed action");
                report.skipped += 1;
                report.errors.push(ReplayError {
                    line: line_num,
                    error: e.to_string(),
                });
                continue;
            }
        };

        let now = action_time(action.time).unwrap_or_else(&fallback_now);
        let outcome = session.record(&action, now)?;
        report.processed += 1;
        report.outcomes.push(ReplayLine {
            line: line_num,
            name: action.kind,
            changed: outcome.diff.indices(),
            canonical: outcome.decision.write_canonical,
            version: outcome.decision.write_version,
        });
    }
    Ok(report)
}

/// Action times are milliseconds since the epoch; zero means unset.
fn action_time(millis: i64) -> Option<DateTime<Utc>> {
    if millis <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(millis)
}
