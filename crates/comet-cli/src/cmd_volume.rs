use anyhow::{Context, Result};
use clap::Args;
use comet_store::{VolumeQuery, find_storage_volume};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct VolumeArgs {
    /// Directory whose entries are candidate volumes
    #[arg(long, default_value = "/Volumes")]
    pub search_dir: PathBuf,

    /// Only volumes whose name contains this
    #[arg(long, default_value = "")]
    pub name_filter: String,

    /// File that marks a volume as comet storage
    #[arg(long, default_value = "traces.cfg")]
    pub key_file: String,

    /// Accept plain directories, not only mount points
    #[arg(long)]
    pub any_directory: bool,
}

impl From<VolumeArgs> for VolumeQuery {
    fn from(args: VolumeArgs) -> Self {
        VolumeQuery {
            search_dir: args.search_dir,
            name_filter: args.name_filter,
            key_file: args.key_file,
            require_mount_point: !args.any_directory,
        }
    }
}

/// Print the first matching volume. Returns false when there is none.
pub fn run(args: VolumeArgs) -> Result<bool> {
    let query = VolumeQuery::from(args);
    let found = find_storage_volume(&query).with_context(|| {
        format!(
            "failed to search {} for storage volumes",
            query.search_dir.display()
        )
    })?;
    match found {
        Some(volume) => {
            println!("{}", volume.display());
            Ok(true)
        }
        None => {
            eprintln!("no volume with {} found", query.key_file);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(search_dir: PathBuf) -> VolumeArgs {
        VolumeArgs {
            search_dir,
            name_filter: String::new(),
            key_file: "traces.cfg".into(),
            any_directory: true,
        }
    }

    #[test]
    fn test_args_to_query() {
        let mut a = args(PathBuf::from("/Volumes"));
        a.any_directory = false;
        let query = VolumeQuery::from(a);
        assert_eq!(query, VolumeQuery::default());
    }

    #[test]
    fn test_run_found_and_missing() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("Drive")).unwrap();
        assert!(!run(args(temp.path().to_path_buf())).unwrap());

        std::fs::write(temp.path().join("Drive/traces.cfg"), "").unwrap();
        assert!(run(args(temp.path().to_path_buf())).unwrap());
    }

    #[test]
    fn test_unreadable_search_dir() {
        let temp = TempDir::new().unwrap();
        assert!(run(args(temp.path().join("missing"))).is_err());
    }
}
