// Collaborator seams for the daily pipeline.
//
// ResultSource: where a day's raw rows come from (fetch layer output).
// IndexStore: the long-lived rolling index for one context.
// EditableStore: the human-editable row store, addressed by tab name.
//
// Tests swap in the in-memory versions from `testing`.

use anyhow::Result;
use chrono::NaiveDate;

use mediapulse_common::{DailyAggregate, RawResult, Table};
use mediapulse_store::{EditableDir, JsonlSource, RollingIndexFile};

pub use crate::classify::SentimentScorer;

// ---------------------------------------------------------------------------
// ResultSource
// ---------------------------------------------------------------------------

pub trait ResultSource: Send + Sync {
    /// Raw rows for `date` in `context`. `None` when nothing was fetched for
    /// that day at all; `Some(vec![])` when the fetch ran and found nothing.
    fn day(&self, date: NaiveDate, context: &str) -> Result<Option<Vec<RawResult>>>;
}

impl ResultSource for JsonlSource {
    fn day(&self, date: NaiveDate, context: &str) -> Result<Option<Vec<RawResult>>> {
        Ok(self.read_day(&date.format("%Y-%m-%d").to_string(), context)?)
    }
}

// ---------------------------------------------------------------------------
// IndexStore
// ---------------------------------------------------------------------------

pub trait IndexStore: Send + Sync {
    fn load(&self) -> Result<Vec<DailyAggregate>>;

    /// Replace the stored index with `rows` in one step.
    fn save(&self, rows: &[DailyAggregate]) -> Result<()>;
}

impl IndexStore for RollingIndexFile {
    fn load(&self) -> Result<Vec<DailyAggregate>> {
        Ok(RollingIndexFile::load(self)?)
    }

    fn save(&self, rows: &[DailyAggregate]) -> Result<()> {
        Ok(RollingIndexFile::save(self, rows)?)
    }
}

// ---------------------------------------------------------------------------
// EditableStore
// ---------------------------------------------------------------------------

pub trait EditableStore: Send + Sync {
    /// Current tab contents; an absent tab reads as empty.
    fn read(&self, tab: &str) -> Result<Table>;

    /// Clear the tab and write `table` in its place.
    fn write(&self, tab: &str, table: &Table) -> Result<()>;
}

impl EditableStore for EditableDir {
    fn read(&self, tab: &str) -> Result<Table> {
        Ok(self.read_tab(tab)?)
    }

    fn write(&self, tab: &str, table: &Table) -> Result<()> {
        Ok(self.write_tab(tab, table)?)
    }
}
