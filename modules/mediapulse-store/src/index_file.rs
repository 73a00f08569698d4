use std::path::{Path, PathBuf};

use tracing::info;

use mediapulse_common::{DailyAggregate, PulseError};

use crate::json_file::{read_json, write_atomic};

/// The rolling index persisted as one JSON array of [`DailyAggregate`] rows.
#[derive(Debug, Clone)]
pub struct RollingIndexFile {
    path: PathBuf,
}

impl RollingIndexFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored rows; empty when the index has never been written.
    pub fn load(&self) -> Result<Vec<DailyAggregate>, PulseError> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    /// Replace the whole file with `rows`.
    pub fn save(&self, rows: &[DailyAggregate]) -> Result<(), PulseError> {
        write_atomic(&self.path, rows)?;
        info!(path = %self.path.display(), rows = rows.len(), "Rolling index saved");
        Ok(())
    }
}
