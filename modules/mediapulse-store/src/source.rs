use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use mediapulse_common::{PulseError, RawResult};

/// Raw results delivered by the fetch layer as `{date}-{context}.jsonl`,
/// one [`RawResult`] per line.
#[derive(Debug, Clone)]
pub struct JsonlSource {
    dir: PathBuf,
}

impl JsonlSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn day_path(&self, date: &str, context: &str) -> PathBuf {
        self.dir.join(format!("{date}-{context}.jsonl"))
    }

    /// `Ok(None)` when no file exists for the day (nothing was fetched);
    /// `Ok(Some(vec![]))` when the file exists but holds no rows.
    /// Malformed lines are logged and skipped.
    pub fn read_day(&self, date: &str, context: &str) -> Result<Option<Vec<RawResult>>, PulseError> {
        let path = self.day_path(date, context);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let mut rows = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawResult>(line) {
                Ok(row) => rows.push(row),
                Err(e) => warn!(
                    path = %path.display(),
                    line = line_no + 1,
                    error = %e,
                    "Skipping malformed raw result"
                ),
            }
        }
        debug!(path = %path.display(), rows = rows.len(), "Loaded raw results");
        Ok(Some(rows))
    }
}
