//! Where comet keeps its data, and how often it keeps versions.
//!
//! Resolution order for the data directory:
//!
//! 1. an explicit directory (command-line flag)
//! 2. the `COMET_DATA_DIR` environment variable
//! 3. the storage volume found by `Comet.volume` in
//!    `~/.jupyter/nbconfig/notebook.json`, when one is configured and present
//! 4. `Comet.data_directory` in the same file
//! 5. `~/.jupyter/comet_data`
//!
//! A configured volume that is not plugged in is logged and skipped.

use crate::error::{Result, StoreError};
use crate::volume::{VolumeQuery, find_storage_volume};
use chrono::Duration;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "COMET_DATA_DIR";
pub const DEFAULT_VERSION_INTERVAL_SECS: u64 = 60;

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CometConfig {
    pub data_directory: PathBuf,
    pub version_interval: Duration,
    /// External volume search from the config file, if any.
    pub volume: Option<VolumeQuery>,
}

/// The part of the Jupyter front-end config file comet reads.
#[derive(Debug, Default, Deserialize)]
struct NbConfigFile {
    #[serde(rename = "Comet", default)]
    comet: Option<CometSection>,
}

#[derive(Debug, Default, Deserialize)]
struct CometSection {
    #[serde(default)]
    data_directory: Option<String>,
    #[serde(default)]
    version_interval_secs: Option<u64>,
    #[serde(default)]
    volume: Option<VolumeSection>,
}

/// `Comet.volume`: unset keys take the [`VolumeQuery`] defaults.
#[derive(Debug, Default, Deserialize)]
struct VolumeSection {
    #[serde(default)]
    search_dir: Option<PathBuf>,
    #[serde(default)]
    name_filter: Option<String>,
    #[serde(default)]
    key_file: Option<String>,
    #[serde(default)]
    require_mount_point: Option<bool>,
}

impl From<VolumeSection> for VolumeQuery {
    fn from(section: VolumeSection) -> Self {
        let defaults = VolumeQuery::default();
        VolumeQuery {
            search_dir: section.search_dir.unwrap_or(defaults.search_dir),
            name_filter: section.name_filter.unwrap_or(defaults.name_filter),
            key_file: section.key_file.unwrap_or(defaults.key_file),
            require_mount_point: section
                .require_mount_point
                .unwrap_or(defaults.require_mount_point),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolver {
    home_dir: Option<PathBuf>,
    env_data_dir: Option<PathBuf>,
    explicit_data_dir: Option<PathBuf>,
    explicit_interval: Option<u64>,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigResolver {
    /// Resolver reading `HOME` and `COMET_DATA_DIR` from the environment.
    pub fn new() -> Self {
        Self {
            home_dir: dirs::home_dir(),
            env_data_dir: env::var_os(DATA_DIR_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            explicit_data_dir: None,
            explicit_interval: None,
        }
    }

    pub fn with_home<P: Into<PathBuf>>(mut self, home: P) -> Self {
        self.home_dir = Some(home.into());
        self
    }

    /// Ignore the environment variable (tests, or hosts that manage their own).
    pub fn without_env(mut self) -> Self {
        self.env_data_dir = None;
        self
    }

    pub fn with_data_dir<P: Into<PathBuf>>(mut self, data_dir: P) -> Self {
        self.explicit_data_dir = Some(data_dir.into());
        self
    }

    pub fn with_version_interval_secs(mut self, secs: u64) -> Self {
        self.explicit_interval = Some(secs);
        self
    }

    pub fn home_dir(&self) -> Result<&Path> {
        self.home_dir.as_deref().ok_or(StoreError::NoHomeDirectory)
    }

    pub fn nbconfig_file(&self) -> Result<PathBuf> {
        Ok(self.home_dir()?.join(".jupyter/nbconfig/notebook.json"))
    }

    pub fn default_data_dir(&self) -> Result<PathBuf> {
        Ok(self.home_dir()?.join(".jupyter/comet_data"))
    }

    pub fn resolve(&self) -> Result<CometConfig> {
        let section = self.read_config_section()?;
        let volume = section.volume.map(VolumeQuery::from);

        let data_directory = match (&self.explicit_data_dir, &self.env_data_dir) {
            (Some(dir), _) | (None, Some(dir)) => dir.clone(),
            (None, None) => match volume.as_ref().map(find_storage_volume).transpose()? {
                Some(Some(root)) => {
                    tracing::info!(volume = %root.display(), "storing on external volume");
                    root
                }
                found => {
                    if found.is_some() {
                        tracing::warn!("no storage volume found, using the local data directory");
                    }
                    match section.data_directory.filter(|d| !d.is_empty()) {
                        Some(dir) => PathBuf::from(dir),
                        None => self.default_data_dir()?,
                    }
                }
            },
        };

        let secs = self
            .explicit_interval
            .or(section.version_interval_secs)
            .unwrap_or(DEFAULT_VERSION_INTERVAL_SECS);
        let version_interval = Duration::seconds(secs.min(u64::from(u32::MAX)) as i64);

        tracing::debug!(
            data_directory = %data_directory.display(),
            version_interval_secs = secs,
            "resolved comet config"
        );
        Ok(CometConfig {
            data_directory,
            version_interval,
            volume,
        })
    }

    /// The `Comet` section of the front-end config, empty if the file (or the
    /// home directory) is absent. A file that exists but does not parse is
    /// an error.
    fn read_config_section(&self) -> Result<CometSection> {
        let Some(home) = self.home_dir.as_deref() else {
            return Ok(CometSection::default());
        };
        let path = home.join(".jupyter/nbconfig/notebook.json");
        if !path.is_file() {
            return Ok(CometSection::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let file: NbConfigFile = serde_json::from_str(&data)
            .map_err(|source| StoreError::Config { path, source })?;
        Ok(file.comet.unwrap_or_default())
    }
}

mod dirs {
    use super::*;

    pub fn home_dir() -> Option<PathBuf> {
        env::var_os("HOME")
            .or_else(|| env::var_os("USERPROFILE"))
            .map(PathBuf::from)
    }
}
