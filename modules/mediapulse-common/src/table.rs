//! Header-plus-rows tabular shape shared by the roster loader, the editable
//! store and the edit-preserving merge. Cells are strings, the way a
//! spreadsheet tab hands them back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One row: column name -> cell value. Absent columns read as empty.
pub type Row = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Column order used when the table is written back out.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build from rows, deriving the column order from first appearance.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn push(&mut self, row: Row) {
        for key in row.keys() {
            if !self.columns.contains(key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    /// First column whose name matches one of `candidates`, ignoring case and
    /// surrounding whitespace. Returns the column name as stored.
    pub fn find_column(&self, candidates: &[&str]) -> Option<&str> {
        candidates.iter().find_map(|want| {
            self.columns
                .iter()
                .find(|have| have.trim().eq_ignore_ascii_case(want))
                .map(String::as_str)
        })
    }
}

/// Trimmed cell value; blank and literal `nan` cells read as empty.
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a str {
    match row.get(column).map(|v| v.trim()) {
        Some(v) if !v.eq_ignore_ascii_case("nan") => v,
        _ => "",
    }
}
