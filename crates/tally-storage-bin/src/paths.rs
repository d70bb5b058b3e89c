//! Filesystem locations for the binary store.

use std::path::PathBuf;

use tally_domain::MonthKey;

pub const GLOBAL_FILE_NAME: &str = "global.dat";

/// Relative file name for one month shard.
pub fn shard_file_name(month: MonthKey) -> String {
    format!("{:04}-{:02}.dat", month.year, month.month)
}

/// Root directory holding the global file and every month shard.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub data_root: PathBuf,
}

impl StoragePaths {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    /// Per-user default: the platform data directory joined with `tally`.
    pub fn default_root() -> Option<Self> {
        dirs::data_dir().map(|base| Self::new(base.join("tally")))
    }

    pub fn global_file(&self) -> PathBuf {
        self.data_root.join(GLOBAL_FILE_NAME)
    }

    pub fn shard_file(&self, month: MonthKey) -> PathBuf {
        self.data_root.join(shard_file_name(month))
    }
}
