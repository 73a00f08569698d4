use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use mediapulse_common::{PulseError, Row, Table};

use crate::json_file::{read_json, write_atomic};

/// On-disk shapes accepted for a table: the explicit `{columns, rows}` form
/// written by this crate, or a bare array of objects as exported by hand.
#[derive(Deserialize)]
#[serde(untagged)]
enum TableShape {
    Explicit(Table),
    Records(Vec<Map<String, Value>>),
}

/// Read a table file. `Ok(None)` when the file does not exist.
pub fn read_table(path: &Path) -> Result<Option<Table>, PulseError> {
    let Some(shape) = read_json::<TableShape>(path)? else {
        return Ok(None);
    };
    let table = match shape {
        TableShape::Explicit(table) => table,
        TableShape::Records(records) => {
            let mut table = Table::default();
            for record in records {
                // Header follows first appearance across records.
                for key in record.keys() {
                    if !table.columns.contains(key) {
                        table.columns.push(key.clone());
                    }
                }
                let row: Row = record
                    .into_iter()
                    .map(|(k, v)| (k, cell_text(v)))
                    .collect();
                table.rows.push(row);
            }
            table
        }
    };
    Ok(Some(table))
}

pub fn write_table(path: &Path, table: &Table) -> Result<(), PulseError> {
    write_atomic(path, table)
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}
