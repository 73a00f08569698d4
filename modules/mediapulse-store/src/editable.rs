use std::path::{Path, PathBuf};

use tracing::{debug, info};

use mediapulse_common::{PulseError, Table};

use crate::table_file::{read_table, write_table};

/// Directory standing in for a spreadsheet: one JSON table per tab.
/// Tabs may be hand-edited between runs.
#[derive(Debug, Clone)]
pub struct EditableDir {
    dir: PathBuf,
}

impl EditableDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Tab name for one day of classified rows in a context.
    pub fn tab_name(date: &str, context: &str) -> String {
        format!("{date}-{context}-rows")
    }

    fn tab_path(&self, tab: &str) -> PathBuf {
        self.dir.join(format!("{tab}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current contents of a tab; empty when the tab does not exist yet.
    pub fn read_tab(&self, tab: &str) -> Result<Table, PulseError> {
        let table = read_table(&self.tab_path(tab))?.unwrap_or_default();
        debug!(tab, rows = table.len(), "Read editable tab");
        Ok(table)
    }

    /// Replace a tab's contents in one write.
    pub fn write_tab(&self, tab: &str, table: &Table) -> Result<(), PulseError> {
        write_table(&self.tab_path(tab), table)?;
        info!(tab, rows = table.len(), "Editable tab written");
        Ok(())
    }
}
