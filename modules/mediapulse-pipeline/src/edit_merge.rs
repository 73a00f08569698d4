//! Three-way merge of fresh row-level output against a hand-edited store.
//!
//! Editors correct `sentiment` and `controlled` in the editable store. A
//! re-run replaces everything else from the fresh rows but carries those
//! corrections over, and never drops a stored row.

use std::collections::HashMap;

use tracing::debug;

use mediapulse_common::{cell, parse_controlled, ClassifiedResult, Row, Sentiment, Table, RESULT_COLUMNS};

/// Fields whose stored values survive a fresh run.
pub const PROTECTED_FIELDS: &[&str] = &["sentiment", "controlled"];

/// Column rows are matched on.
pub const KEY_FIELD: &str = "url";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub table: Table,
    /// Fresh rows that found a stored counterpart.
    pub matched: usize,
    /// Protected cells whose stored value differed from the fresh one.
    pub edits_preserved: usize,
    /// Stored rows with no fresh counterpart, kept as-is.
    pub orphans_kept: usize,
    /// Fresh rows with a blank key, always emitted as new.
    pub unkeyed: usize,
}

/// Merge `fresh` over `stored`, keyed on `key_field`.
///
/// Output columns are the fresh columns, followed by any stored-only columns.
/// Fresh rows come first in their own order, then unmatched stored rows in
/// stored order. Blank keys never match. When the store holds the same key
/// twice, the first copy is matched and the rest are kept as orphans.
pub fn merge(fresh: &Table, stored: &Table, key_field: &str, protected: &[&str]) -> MergeOutcome {
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, row) in stored.rows.iter().enumerate() {
        let key = cell(row, key_field);
        if !key.is_empty() {
            index.entry(key).or_insert(i);
        }
    }

    let mut columns = fresh.columns.clone();
    for c in &stored.columns {
        if !columns.contains(c) {
            columns.push(c.clone());
        }
    }

    let mut outcome = MergeOutcome::default();
    let mut consumed = vec![false; stored.rows.len()];
    let mut rows: Vec<Row> = Vec::with_capacity(fresh.rows.len() + stored.rows.len());

    for fresh_row in &fresh.rows {
        let mut merged = fresh_row.clone();
        let key = cell(fresh_row, key_field);
        if key.is_empty() {
            outcome.unkeyed += 1;
            rows.push(merged);
            continue;
        }
        if let Some(i) = index.remove(key) {
            consumed[i] = true;
            outcome.matched += 1;
            let stored_row = &stored.rows[i];
            for field in protected {
                let value = cell(stored_row, field);
                if value.is_empty() {
                    continue;
                }
                if cell(&merged, field) != value {
                    outcome.edits_preserved += 1;
                }
                merged.insert(field.to_string(), value.to_string());
            }
        }
        rows.push(merged);
    }

    for (i, row) in stored.rows.iter().enumerate() {
        if !consumed[i] {
            outcome.orphans_kept += 1;
            rows.push(row.clone());
        }
    }

    debug!(
        fresh = fresh.rows.len(),
        stored = stored.rows.len(),
        matched = outcome.matched,
        edits_preserved = outcome.edits_preserved,
        orphans_kept = outcome.orphans_kept,
        "Merged editable rows"
    );
    outcome.table = Table { columns, rows };
    outcome
}

/// Apply stored protected values to classified results, matched by URL.
/// Used when aggregates should reflect hand edits.
pub fn overlay_protected(results: &mut [ClassifiedResult], stored: &Table) -> usize {
    let mut by_url: HashMap<&str, &Row> = HashMap::new();
    for row in &stored.rows {
        let key = cell(row, KEY_FIELD);
        if !key.is_empty() {
            by_url.entry(key).or_insert(row);
        }
    }
    let mut applied = 0;
    for result in results.iter_mut() {
        let Some(row) = by_url.get(result.raw.url.trim()) else {
            continue;
        };
        let sentiment = cell(row, "sentiment");
        if !sentiment.is_empty() {
            let label = Sentiment::from_label(sentiment);
            if label != result.sentiment {
                result.sentiment = label;
                applied += 1;
            }
        }
        let controlled = cell(row, "controlled");
        if !controlled.is_empty() {
            let flag = parse_controlled(controlled);
            if flag != result.controlled {
                result.controlled = flag;
                applied += 1;
            }
        }
    }
    applied
}

/// Row-level table for a day's results, in the stored column layout.
pub fn results_table(results: &[ClassifiedResult]) -> Table {
    Table {
        columns: RESULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: results.iter().map(ClassifiedResult::to_row).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn table(columns: &[&str], rows: Vec<Row>) -> Table {
        Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn protected_fields_survive_fresh_run() {
        let stored = table(
            &["url", "sentiment", "controlled", "title"],
            vec![row(&[("url", "u1"), ("sentiment", "positive"), ("controlled", "true"), ("title", "old title")])],
        );
        let fresh = table(
            &["url", "sentiment", "controlled", "title"],
            vec![row(&[("url", "u1"), ("sentiment", "negative"), ("controlled", "false"), ("title", "new title")])],
        );
        let out = merge(&fresh, &stored, KEY_FIELD, PROTECTED_FIELDS);
        assert_eq!(
            out.table.rows,
            vec![row(&[("url", "u1"), ("sentiment", "positive"), ("controlled", "true"), ("title", "new title")])]
        );
        assert_eq!(out.matched, 1);
        assert_eq!(out.edits_preserved, 2);
    }

    #[test]
    fn unmatched_stored_rows_are_kept_unchanged() {
        let manual = row(&[("url", "u9"), ("sentiment", "negative"), ("note", "added by hand")]);
        let stored = table(&["url", "sentiment", "note"], vec![manual.clone()]);
        let fresh = table(&["url", "sentiment"], vec![row(&[("url", "u1"), ("sentiment", "neutral")])]);
        let out = merge(&fresh, &stored, KEY_FIELD, PROTECTED_FIELDS);
        assert_eq!(out.table.rows.len(), 2);
        assert_eq!(out.table.rows[1], manual);
        assert_eq!(out.orphans_kept, 1);
        assert_eq!(out.table.columns, vec!["url", "sentiment", "note"]);
    }

    #[test]
    fn blank_keys_never_match() {
        let stored = table(&["url", "sentiment"], vec![row(&[("url", ""), ("sentiment", "positive")])]);
        let fresh = table(&["url", "sentiment"], vec![row(&[("url", "  "), ("sentiment", "negative")])]);
        let out = merge(&fresh, &stored, KEY_FIELD, PROTECTED_FIELDS);
        assert_eq!(out.matched, 0);
        assert_eq!(out.unkeyed, 1);
        assert_eq!(out.table.rows[0]["sentiment"], "negative");
        assert_eq!(out.table.rows.len(), 2);
    }

    #[test]
    fn blank_stored_protected_value_does_not_clobber() {
        let stored = table(&["url", "sentiment"], vec![row(&[("url", "u1"), ("sentiment", "")])]);
        let fresh = table(&["url", "sentiment"], vec![row(&[("url", "u1"), ("sentiment", "negative")])]);
        let out = merge(&fresh, &stored, KEY_FIELD, PROTECTED_FIELDS);
        assert_eq!(out.table.rows[0]["sentiment"], "negative");
        assert_eq!(out.edits_preserved, 0);
    }

    #[test]
    fn duplicate_stored_keys_match_once() {
        let stored = table(
            &["url", "sentiment"],
            vec![
                row(&[("url", "u1"), ("sentiment", "positive")]),
                row(&[("url", "u1"), ("sentiment", "negative")]),
            ],
        );
        let fresh = table(&["url", "sentiment"], vec![row(&[("url", "u1"), ("sentiment", "neutral")])]);
        let out = merge(&fresh, &stored, KEY_FIELD, PROTECTED_FIELDS);
        assert_eq!(out.table.rows[0]["sentiment"], "positive");
        assert_eq!(out.orphans_kept, 1);
    }

    #[test]
    fn remerging_own_output_is_stable() {
        let stored = table(&["url", "sentiment"], vec![row(&[("url", "u1"), ("sentiment", "positive")])]);
        let fresh = table(&["url", "sentiment"], vec![row(&[("url", "u1"), ("sentiment", "negative")])]);
        let first = merge(&fresh, &stored, KEY_FIELD, PROTECTED_FIELDS).table;
        let second = merge(&fresh, &first, KEY_FIELD, PROTECTED_FIELDS).table;
        assert_eq!(first, second);
    }
}
