//! Locating an external storage volume marked with a key file.

use crate::error::{Result, StoreError};
use std::path::{Path, PathBuf};

/// What to look for when searching for a storage volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeQuery {
    /// Directory whose entries are candidate volumes (e.g. `/Volumes`).
    pub search_dir: PathBuf,
    /// Substring the volume name must contain. Empty matches everything.
    pub name_filter: String,
    /// File that must exist at the root of the volume.
    pub key_file: String,
    /// Only accept candidates that are mount points.
    pub require_mount_point: bool,
}

impl Default for VolumeQuery {
    fn default() -> Self {
        Self {
            search_dir: PathBuf::from("/Volumes"),
            name_filter: String::new(),
            key_file: "traces.cfg".to_string(),
            require_mount_point: true,
        }
    }
}

/// First volume (in name order) matching `query`, or `None`.
///
/// Failing to list `search_dir` itself is an error. A candidate volume that
/// cannot be read is skipped with a warning.
pub fn find_storage_volume(query: &VolumeQuery) -> Result<Option<PathBuf>> {
    let entries =
        std::fs::read_dir(&query.search_dir).map_err(|source| StoreError::VolumeSearch {
            path: query.search_dir.clone(),
            source,
        })?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.contains(query.name_filter.as_str()))
        })
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    candidates.sort();

    for volume in candidates {
        if query.require_mount_point && !is_mount_point(&volume, &query.search_dir) {
            continue;
        }
        match has_key_file(&volume, &query.key_file) {
            Ok(true) => {
                tracing::debug!(volume = %volume.display(), "found storage volume");
                return Ok(Some(volume));
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(volume = %volume.display(), error = %e, "skipping unreadable volume");
            }
        }
    }
    Ok(None)
}

fn has_key_file(volume: &Path, key_file: &str) -> std::io::Result<bool> {
    for entry in std::fs::read_dir(volume)? {
        if entry?.file_name().to_str() == Some(key_file) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// A directory is a mount point when it lives on a different device than
/// its parent.
#[cfg(unix)]
fn is_mount_point(path: &Path, parent: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (std::fs::metadata(path), std::fs::metadata(parent)) {
        (Ok(dir), Ok(parent)) => dir.dev() != parent.dev(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_mount_point(path: &Path, _parent: &Path) -> bool {
    path.is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn query(search_dir: &Path) -> VolumeQuery {
        VolumeQuery {
            search_dir: search_dir.to_path_buf(),
            require_mount_point: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_finds_volume_with_key_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("Backup")).unwrap();
        fs::create_dir_all(temp.path().join("Traces")).unwrap();
        fs::write(temp.path().join("Traces/traces.cfg"), "").unwrap();

        let found = find_storage_volume(&query(temp.path())).unwrap();
        assert_eq!(found, Some(temp.path().join("Traces")));
    }

    #[test]
    fn test_name_filter_applies() {
        let temp = TempDir::new().unwrap();
        for name in ["A", "B-traces"] {
            fs::create_dir_all(temp.path().join(name)).unwrap();
            fs::write(temp.path().join(name).join("traces.cfg"), "").unwrap();
        }
        let mut q = query(temp.path());
        q.name_filter = "traces".into();
        assert_eq!(
            find_storage_volume(&q).unwrap(),
            Some(temp.path().join("B-traces"))
        );
    }

    #[test]
    fn test_no_match_is_none() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("Empty")).unwrap();
        fs::write(temp.path().join("loose-file"), "").unwrap();
        assert_eq!(find_storage_volume(&query(temp.path())).unwrap(), None);
    }

    #[test]
    fn test_plain_directories_are_not_mount_points() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("Traces")).unwrap();
        fs::write(temp.path().join("Traces/traces.cfg"), "").unwrap();
        let mut q = query(temp.path());
        q.require_mount_point = true;
        assert_eq!(find_storage_volume(&q).unwrap(), None);
    }

    #[test]
    fn test_missing_search_dir_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = find_storage_volume(&query(&temp.path().join("nope"))).unwrap_err();
        assert!(matches!(err, StoreError::VolumeSearch { .. }));
    }
}
