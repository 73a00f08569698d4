use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::warn;

use mediapulse_common::{DailyAggregate, EntityKey};

/// Date-sorted history of daily aggregates, one row per `(date, entity)`.
///
/// The only mutation is [`RollingIndex::upsert`], which replaces a whole
/// date at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollingIndex {
    rows: Vec<DailyAggregate>,
}

type Key = (NaiveDate, EntityKey);

fn keyed(rows: impl IntoIterator<Item = DailyAggregate>) -> BTreeMap<Key, DailyAggregate> {
    // Later duplicates win.
    rows.into_iter()
        .map(|r| ((r.date, r.entity.clone()), r))
        .collect()
}

impl RollingIndex {
    /// Build from stored rows, collapsing duplicate keys (last wins) and
    /// restoring sort order.
    pub fn from_rows(rows: Vec<DailyAggregate>) -> Self {
        let before = rows.len();
        let rows: Vec<DailyAggregate> = keyed(rows).into_values().collect();
        if rows.len() != before {
            warn!(dropped = before - rows.len(), "Stored index had duplicate (date, entity) rows");
        }
        Self { rows }
    }

    /// Replace every row for `date` with `fresh`. Rows in `fresh` dated
    /// otherwise are dropped. Re-running with the same input is a no-op.
    pub fn upsert(self, date: NaiveDate, fresh: Vec<DailyAggregate>) -> Self {
        let mut kept: Vec<DailyAggregate> = self.rows.into_iter().filter(|r| r.date != date).collect();

        let (matching, stray): (Vec<_>, Vec<_>) = fresh.into_iter().partition(|r| r.date == date);
        if !stray.is_empty() {
            warn!(%date, dropped = stray.len(), "Ignoring aggregates dated outside the upserted day");
        }
        kept.extend(keyed(matching).into_values());
        kept.sort_by(|a, b| (a.date, &a.entity).cmp(&(b.date, &b.entity)));
        Self { rows: kept }
    }

    /// Drop rows dated before `cutoff`. Returns the pruned index and how many
    /// rows were removed.
    pub fn prune_before(self, cutoff: NaiveDate) -> (Self, usize) {
        let before = self.rows.len();
        let rows: Vec<DailyAggregate> = self.rows.into_iter().filter(|r| r.date >= cutoff).collect();
        let removed = before - rows.len();
        (Self { rows }, removed)
    }

    pub fn rows(&self) -> &[DailyAggregate] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<DailyAggregate> {
        self.rows
    }

    pub fn rows_for(&self, date: NaiveDate) -> impl Iterator<Item = &DailyAggregate> {
        self.rows.iter().filter(move |r| r.date == date)
    }

    /// Distinct dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.rows.iter().map(|r| r.date).collect();
        dates.dedup();
        dates
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, day).unwrap()
    }

    fn agg(day: u32, person: &str, total: u32) -> DailyAggregate {
        let mut a = DailyAggregate::zero(d(day), EntityKey::new(person, "Acme"));
        a.total = total;
        a.neutral = total;
        a
    }

    #[test]
    fn upsert_replaces_whole_day() {
        let index = RollingIndex::from_rows(vec![agg(1, "Jane", 1), agg(2, "Jane", 2), agg(2, "John", 3)]);
        let index = index.upsert(d(2), vec![agg(2, "Jane", 9)]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.rows_for(d(2)).map(|r| r.total).collect::<Vec<_>>(), vec![9]);
        assert_eq!(index.rows_for(d(1)).count(), 1);
    }

    #[test]
    fn upsert_is_idempotent() {
        let base = RollingIndex::from_rows(vec![agg(1, "Jane", 1)]);
        let fresh = vec![agg(3, "John", 4), agg(3, "Jane", 2)];
        let once = base.clone().upsert(d(3), fresh.clone());
        let twice = once.clone().upsert(d(3), fresh);
        assert_eq!(once, twice);
    }

    #[test]
    fn keys_stay_unique_and_sorted() {
        let mut index = RollingIndex::default();
        for day in [5, 1, 3, 1, 5] {
            index = index.upsert(d(day), vec![agg(day, "Zed", 1), agg(day, "Amy", 1), agg(day, "Amy", 2)]);
        }
        let keys: Vec<_> = index.rows().iter().map(|r| (r.date, r.entity.clone())).collect();
        let unique: HashSet<_> = keys.iter().cloned().collect();
        assert_eq!(keys.len(), unique.len());
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(index.dates(), vec![d(1), d(3), d(5)]);
        assert_eq!(index.latest_date(), Some(d(5)));
    }

    #[test]
    fn stray_dates_are_ignored() {
        let index = RollingIndex::default().upsert(d(2), vec![agg(2, "Jane", 1), agg(3, "Jane", 1)]);
        assert_eq!(index.dates(), vec![d(2)]);
    }

    #[test]
    fn from_rows_collapses_duplicates() {
        let index = RollingIndex::from_rows(vec![agg(2, "Jane", 1), agg(1, "Jane", 1), agg(2, "Jane", 7)]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.rows()[1].total, 7);
    }

    #[test]
    fn prune_keeps_cutoff_day() {
        let index = RollingIndex::from_rows(vec![agg(1, "Jane", 1), agg(2, "Jane", 1), agg(3, "Jane", 1)]);
        let (pruned, removed) = index.prune_before(d(2));
        assert_eq!(removed, 1);
        assert_eq!(pruned.dates(), vec![d(2), d(3)]);
    }
}
