use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use mediapulse_common::{ClassifiedResult, DailyAggregate, EntityKey, Sentiment};

use crate::theme::{ThemeExtractor, NO_THEME};

/// What to compute beyond the sentiment counts.
#[derive(Default, Clone, Copy)]
pub struct AggregateOptions<'a> {
    pub count_controlled: bool,
    pub theme: Option<&'a ThemeExtractor>,
}

/// Fold one day's classified rows into per-entity counts.
///
/// Every roster entity gets a row, zero counts included. Unresolved rows are
/// skipped here and stay in the row-level output. Output is sorted by entity.
pub fn aggregate(
    results: &[ClassifiedResult],
    date: NaiveDate,
    roster: &[EntityKey],
    options: AggregateOptions<'_>,
) -> Vec<DailyAggregate> {
    let mut by_entity: BTreeMap<EntityKey, DailyAggregate> = roster
        .iter()
        .map(|e| (e.clone(), DailyAggregate::zero(date, e.clone())))
        .collect();
    let mut negative_titles: BTreeMap<EntityKey, Vec<&str>> = BTreeMap::new();
    let mut unresolved = 0usize;

    for result in results {
        let Some(entity) = &result.entity else {
            unresolved += 1;
            continue;
        };
        let agg = by_entity
            .entry(entity.clone())
            .or_insert_with(|| DailyAggregate::zero(date, entity.clone()));
        agg.tally(result.sentiment);
        if options.count_controlled && result.controlled {
            *agg.controlled_count.get_or_insert(0) += 1;
        }
        if result.sentiment == Sentiment::Negative {
            negative_titles
                .entry(entity.clone())
                .or_default()
                .push(result.raw.title.as_str());
        }
    }

    for (entity, agg) in by_entity.iter_mut() {
        if options.count_controlled && agg.controlled_count.is_none() {
            agg.controlled_count = Some(0);
        }
        if let Some(extractor) = options.theme {
            agg.theme = Some(match negative_titles.get(entity) {
                Some(titles) => extractor.extract(titles, entity),
                None => NO_THEME.to_string(),
            });
        }
    }

    debug!(
        %date,
        entities = by_entity.len(),
        rows = results.len(),
        unresolved,
        "Aggregated day"
    );
    by_entity.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediapulse_common::config::ThemeConfig;
    use mediapulse_common::RawResult;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 15).unwrap()
    }

    fn row(entity: Option<EntityKey>, title: &str, sentiment: Sentiment, controlled: bool) -> ClassifiedResult {
        ClassifiedResult {
            date: day(),
            raw: RawResult {
                query_alias: String::new(),
                title: title.into(),
                url: format!("https://example.org/{}", title.len()),
                snippet: None,
                position: None,
                domain: String::new(),
                published: None,
            },
            entity,
            sentiment,
            controlled,
            compound: 0.0,
        }
    }

    #[test]
    fn zero_activity_roster_entities_get_rows() {
        let roster = vec![EntityKey::new("Jane Doe", "Acme Corp"), EntityKey::new("John Roe", "Globex")];
        let out = aggregate(&[], day(), &roster, AggregateOptions::default());
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|a| a.total == 0 && a.is_consistent()));
        assert!(out.iter().all(|a| a.theme.is_none() && a.controlled_count.is_none()));
    }

    #[test]
    fn unresolved_rows_are_excluded() {
        let jane = EntityKey::new("Jane Doe", "Acme Corp");
        let rows = vec![
            row(Some(jane.clone()), "a", Sentiment::Positive, true),
            row(None, "b", Sentiment::Negative, false),
            row(Some(jane.clone()), "c", Sentiment::Neutral, false),
        ];
        let out = aggregate(&rows, day(), &[jane], AggregateOptions::default());
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].total, out[0].positive, out[0].neutral, out[0].negative), (2, 1, 1, 0));
    }

    #[test]
    fn controlled_count_and_theme_when_requested() {
        let jane = EntityKey::new("Jane Doe", "Acme Corp");
        let roe = EntityKey::new("John Roe", "Globex");
        let rows = vec![
            row(Some(jane.clone()), "Jane Doe scandal rocks Acme", Sentiment::Negative, false),
            row(Some(jane.clone()), "Acme site", Sentiment::Positive, true),
        ];
        let extractor = ThemeExtractor::new(&ThemeConfig::default());
        let options = AggregateOptions {
            count_controlled: true,
            theme: Some(&extractor),
        };
        let out = aggregate(&rows, day(), &[jane.clone(), roe.clone()], options);
        let j = out.iter().find(|a| a.entity == jane).unwrap();
        assert_eq!(j.controlled_count, Some(1));
        assert_eq!(j.theme.as_deref(), Some("scandal rocks"));
        let r = out.iter().find(|a| a.entity == roe).unwrap();
        assert_eq!(r.controlled_count, Some(0));
        assert_eq!(r.theme.as_deref(), Some(NO_THEME));
    }

    #[test]
    fn alias_only_entities_are_aggregated_too() {
        let extra = EntityKey::new("Sam Poe", "Initech");
        let rows = vec![row(Some(extra.clone()), "x", Sentiment::Neutral, false)];
        let out = aggregate(&rows, day(), &[], AggregateOptions::default());
        assert_eq!(out[0].entity, extra);
        assert_eq!(out[0].neutral, 1);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let jane = EntityKey::new("Jane Doe", "Acme Corp");
        let rows = vec![row(Some(jane.clone()), "a", Sentiment::Negative, false)];
        let a = aggregate(&rows, day(), &[jane.clone()], AggregateOptions::default());
        let b = aggregate(&rows, day(), &[jane], AggregateOptions::default());
        assert_eq!(a, b);
    }
}
