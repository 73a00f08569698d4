use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;

use mediapulse_common::PulseError;

use crate::json_file::{read_json, write_atomic};

/// Persisted map of alert key -> date of the last alert sent for it.
#[derive(Debug, Clone)]
pub struct AlertLedgerFile {
    path: PathBuf,
}

impl AlertLedgerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A corrupt ledger is an error, never an empty map.
    pub fn load(&self) -> Result<BTreeMap<String, NaiveDate>, PulseError> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    pub fn save(&self, entries: &BTreeMap<String, NaiveDate>) -> Result<(), PulseError> {
        write_atomic(&self.path, entries)
    }
}
