mod cmd_diff;
mod cmd_inspect;
mod cmd_record;
mod cmd_volume;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comet::v1::NotebookId;
use comet_store::{CometConfig, ConfigResolver};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "comet")]
#[command(about = "Record, diff, and inspect the edit history of Jupyter notebooks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory (overrides COMET_DATA_DIR and the Jupyter config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process one action descriptor against stored history
    Record {
        #[command(flatten)]
        args: cmd_record::RecordArgs,

        /// Do not commit the canonical snapshot to git
        #[arg(long)]
        no_git: bool,
    },
    /// Process a JSON-lines stream of action descriptors in order
    Replay {
        #[command(flatten)]
        args: cmd_record::RecordArgs,

        /// Do not commit the canonical snapshot to git
        #[arg(long)]
        no_git: bool,
    },
    /// Diff one action against a notebook file without touching storage
    Diff {
        /// Notebook the action is compared against
        #[arg(long)]
        prior: PathBuf,

        /// Action descriptor file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Also print a unified diff of each changed cell's source
        #[arg(long)]
        patch: bool,
    },
    /// Compare two notebooks; exits 1 if they differ
    Same {
        a: PathBuf,
        b: PathBuf,

        /// Compare cell types and sources only
        #[arg(long)]
        ignore_outputs: bool,
    },
    /// Print the recorded actions of a notebook
    Log {
        #[arg(short, long)]
        notebook: String,
    },
    /// List notebooks with stored history
    List,
    /// List the version timestamps of a notebook
    Versions {
        #[arg(short, long)]
        notebook: String,
    },
    /// Runs, deletions, active time and version strips of a notebook
    Summary {
        #[arg(short, long)]
        notebook: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find an external storage volume marked with a key file
    Volume {
        #[command(flatten)]
        args: cmd_volume::VolumeArgs,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let data_dir = cli.data_dir.as_deref();
    match cli.command {
        Commands::Record { args, no_git } => {
            cmd_record::run_record(args, !no_git, data_dir, cli.pretty)?;
        }
        Commands::Replay { args, no_git } => {
            cmd_record::run_replay(args, !no_git, data_dir, cli.pretty)?;
        }
        Commands::Diff {
            prior,
            input,
            patch,
        } => cmd_diff::run_diff(&prior, input.as_deref(), patch, cli.pretty)?,
        Commands::Same {
            a,
            b,
            ignore_outputs,
        } => {
            if !cmd_diff::run_same(&a, &b, ignore_outputs)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Log { notebook } => cmd_inspect::run_log(&notebook, data_dir, cli.pretty)?,
        Commands::List => cmd_inspect::run_list(data_dir)?,
        Commands::Versions { notebook } => cmd_inspect::run_versions(&notebook, data_dir)?,
        Commands::Summary { notebook, json } => {
            cmd_inspect::run_summary(&notebook, data_dir, json, cli.pretty)?
        }
        Commands::Volume { args } => {
            if !cmd_volume::run(args)? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// `RUST_LOG` applies unless `-v` is given; the default shows warnings only.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

// ============================================================================
// Helpers shared by the subcommands
// ============================================================================

pub(crate) fn load_config(
    data_dir: Option<&Path>,
    version_interval_secs: Option<u64>,
) -> Result<CometConfig> {
    let mut resolver = ConfigResolver::new();
    if let Some(dir) = data_dir {
        resolver = resolver.with_data_dir(dir);
    }
    if let Some(secs) = version_interval_secs {
        resolver = resolver.with_version_interval_secs(secs);
    }
    resolver.resolve().context("failed to resolve comet configuration")
}

/// Read a file, or stdin when no path is given.
pub(crate) fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Notebook identity from a notebook path or a bare name.
pub(crate) fn notebook_id(notebook: &str) -> Result<NotebookId> {
    NotebookId::from_path(Path::new(notebook))
        .with_context(|| format!("cannot derive a notebook name from {:?}", notebook))
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("failed to serialize output")
}
