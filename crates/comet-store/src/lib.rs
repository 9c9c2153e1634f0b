#![doc = include_str!("../README.md")]

pub mod action_log;
pub mod config;
pub mod error;
pub mod io;
pub mod paths;
mod provider;
pub mod summary;
pub mod volume;

pub use action_log::ActionLogFile;
pub use config::{CometConfig, ConfigResolver, DATA_DIR_ENV, DEFAULT_VERSION_INTERVAL_SECS};
pub use error::{Result, StoreError};
pub use io::{FsStore, read_notebook};
pub use paths::{StorageLayout, VERSION_TIME_FORMAT, parse_version_timestamp, version_file_name};
pub use summary::{CellDisplay, UsageSummary, VersionStrip, summarize};
pub use volume::{VolumeQuery, find_storage_volume};
