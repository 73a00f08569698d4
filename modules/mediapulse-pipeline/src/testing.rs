// Test doubles for the pipeline's collaborator seams.
//
// - MockSource (ResultSource): (date, context) -> raw rows
// - MemoryIndexStore (IndexStore): in-memory rolling index, counts saves
// - MemoryEditableStore (EditableStore): in-memory tabs, counts writes
// - FixedScorer (SentimentScorer): exact text -> compound, with a default

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use chrono::NaiveDate;

use mediapulse_common::{DailyAggregate, RawResult, Table};

use crate::classify::SentimentScorer;
use crate::traits::{EditableStore, IndexStore, ResultSource};

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Returns `None` for any (date, context) not registered with `.on_day()`.
#[derive(Default)]
pub struct MockSource {
    days: HashMap<(NaiveDate, String), Vec<RawResult>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_day(mut self, date: NaiveDate, context: &str, rows: Vec<RawResult>) -> Self {
        self.days.insert((date, context.to_string()), rows);
        self
    }
}

impl ResultSource for MockSource {
    fn day(&self, date: NaiveDate, context: &str) -> Result<Option<Vec<RawResult>>> {
        Ok(self.days.get(&(date, context.to_string())).cloned())
    }
}

// ---------------------------------------------------------------------------
// MemoryIndexStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryIndexStore {
    rows: Mutex<Vec<DailyAggregate>>,
    saves: Mutex<usize>,
    fail_saves: bool,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<DailyAggregate>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    /// Every `save` returns an error and leaves the rows unchanged.
    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    pub fn rows(&self) -> Vec<DailyAggregate> {
        self.rows.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl IndexStore for MemoryIndexStore {
    fn load(&self) -> Result<Vec<DailyAggregate>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    fn save(&self, rows: &[DailyAggregate]) -> Result<()> {
        if self.fail_saves {
            bail!("MemoryIndexStore: save failed");
        }
        *self.rows.lock().unwrap() = rows.to_vec();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryEditableStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryEditableStore {
    tabs: Mutex<HashMap<String, Table>>,
    writes: Mutex<usize>,
}

impl MemoryEditableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tab(self, tab: &str, table: Table) -> Self {
        self.tabs.lock().unwrap().insert(tab.to_string(), table);
        self
    }

    pub fn tab(&self, tab: &str) -> Option<Table> {
        self.tabs.lock().unwrap().get(tab).cloned()
    }

    /// Simulate a human editing one cell between runs.
    pub fn edit_cell(&self, tab: &str, key_column: &str, key: &str, column: &str, value: &str) {
        let mut tabs = self.tabs.lock().unwrap();
        let table = tabs.get_mut(tab).expect("tab exists");
        let row = table
            .rows
            .iter_mut()
            .find(|r| r.get(key_column).map(String::as_str) == Some(key))
            .expect("row exists");
        row.insert(column.to_string(), value.to_string());
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

impl EditableStore for MemoryEditableStore {
    fn read(&self, tab: &str) -> Result<Table> {
        Ok(self.tab(tab).unwrap_or_default())
    }

    fn write(&self, tab: &str, table: &Table) -> Result<()> {
        self.tabs.lock().unwrap().insert(tab.to_string(), table.clone());
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FixedScorer
// ---------------------------------------------------------------------------

/// Deterministic scorer: registered texts score as given (after trimming),
/// everything else scores `default`.
pub struct FixedScorer {
    default: f64,
    scores: HashMap<String, f64>,
}

impl FixedScorer {
    pub fn new(default: f64) -> Self {
        Self {
            default,
            scores: HashMap::new(),
        }
    }

    pub fn on_text(mut self, text: &str, compound: f64) -> Self {
        self.scores.insert(text.trim().to_string(), compound);
        self
    }
}

impl SentimentScorer for FixedScorer {
    fn compound(&self, text: &str) -> f64 {
        self.scores.get(text.trim()).copied().unwrap_or(self.default)
    }
}
