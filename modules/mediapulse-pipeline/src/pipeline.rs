//! One day of work for one context: intake, resolve, classify, aggregate,
//! then persist to the rolling index and the editable store.
//!
//! `transform` is pure. Nothing is written until it has produced a complete
//! result, so a failure part-way through a day leaves both stores untouched.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use mediapulse_common::config::{ContextConfig, IntakeConfig, PathsConfig, RetentionConfig};
use mediapulse_common::{ClassifiedResult, DailyAggregate, FileConfig, PulseError, RawResult, Sentiment, Table};
use mediapulse_store::{read_table, EditableDir};

use crate::aggregate::{aggregate, AggregateOptions};
use crate::classify::{Classifier, SentimentScorer};
use crate::edit_merge::{merge, overlay_protected, results_table, KEY_FIELD, PROTECTED_FIELDS};
use crate::intake;
use crate::resolver::{resolve, Resolution};
use crate::rolling_index::RollingIndex;
use crate::roster::{aliases_from_table, roster_from_table, AliasIndex};
use crate::stats::RunStats;
use crate::theme::ThemeExtractor;
use crate::traits::{EditableStore, IndexStore, ResultSource};

/// Build the alias index from the configured roster and alias tables.
/// A missing roster is a configuration error; a missing alias table just
/// means no explicit aliases.
pub fn load_alias_index(paths: &PathsConfig) -> Result<AliasIndex, PulseError> {
    let roster_table = read_table(&paths.roster)?.ok_or_else(|| {
        PulseError::Config(format!("roster file not found: {}", paths.roster.display()))
    })?;
    let roster = roster_from_table(&roster_table)?;
    let aliases = match read_table(&paths.aliases)? {
        Some(table) => aliases_from_table(&table)?,
        None => Vec::new(),
    };
    let index = AliasIndex::build(&roster, &aliases)?;
    info!(
        roster = roster.len(),
        explicit_aliases = aliases.len(),
        aliases = index.len(),
        "Alias index ready"
    );
    Ok(index)
}

/// Everything computed for one day, before anything is persisted.
#[derive(Debug, Clone)]
pub struct DayOutput {
    pub date: NaiveDate,
    /// Row-level output, unresolved rows included.
    pub results: Vec<ClassifiedResult>,
    pub aggregates: Vec<DailyAggregate>,
    pub stats: RunStats,
}

pub struct DailyPipeline {
    context_name: String,
    context: ContextConfig,
    aliases: AliasIndex,
    classifier: Classifier,
    theme: ThemeExtractor,
    intake: IntakeConfig,
    retention: RetentionConfig,
}

impl DailyPipeline {
    pub fn new(
        config: &FileConfig,
        context_name: &str,
        aliases: AliasIndex,
        scorer: Arc<dyn SentimentScorer>,
    ) -> Result<Self, PulseError> {
        config.validate()?;
        let context = config.context(context_name)?.clone();
        let classifier = Classifier::new(&context, &config.control, &config.sentiment, scorer);
        Ok(Self {
            context_name: context_name.to_string(),
            context,
            aliases,
            classifier,
            theme: ThemeExtractor::new(&config.theme),
            intake: config.intake.clone(),
            retention: config.retention.clone(),
        })
    }

    pub fn context_name(&self) -> &str {
        &self.context_name
    }

    pub fn aliases(&self) -> &AliasIndex {
        &self.aliases
    }

    /// Editable-store tab holding `date`'s rows for this context.
    pub fn tab_name(&self, date: NaiveDate) -> String {
        EditableDir::tab_name(&date.format("%Y-%m-%d").to_string(), &self.context_name)
    }

    /// Resolve, classify and aggregate one day's raw rows. `stored_edits`,
    /// when given, overrides protected fields before counting.
    pub fn transform(&self, date: NaiveDate, raw: Vec<RawResult>, stored_edits: Option<&Table>) -> DayOutput {
        let mut stats = RunStats {
            dates_processed: 1,
            ..RunStats::default()
        };

        let (rows, intake_stats) = intake::prepare(raw, &self.intake);
        stats.record_intake(&intake_stats);

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let resolution = resolve(&row.query_alias, &self.aliases);
            match &resolution {
                Resolution::Exact(_) => stats.resolved_exact += 1,
                Resolution::TokenSubset { .. } => stats.resolved_fallback += 1,
                Resolution::Unresolved => {
                    stats.unresolved += 1;
                    warn!(alias = row.query_alias.as_str(), url = row.url.as_str(), "Unresolved alias");
                }
            }
            let entity = resolution.into_entity();
            let owned = entity
                .as_ref()
                .map(|e| self.aliases.owned_domains(e))
                .unwrap_or(&[]);
            results.push(self.classifier.classify(date, row, entity, owned));
        }

        if let Some(stored) = stored_edits {
            stats.edits_applied = overlay_protected(&mut results, stored) as u32;
        }

        for r in &results {
            let slot = match r.sentiment {
                Sentiment::Positive => 0,
                Sentiment::Neutral => 1,
                Sentiment::Negative => 2,
            };
            stats.by_sentiment[slot] += 1;
            if r.controlled {
                stats.controlled += 1;
            }
        }
        stats.rows_classified = results.len() as u32;

        let options = AggregateOptions {
            count_controlled: self.context.count_controlled,
            theme: self.context.extract_theme.then_some(&self.theme),
        };
        let aggregates = aggregate(&results, date, self.aliases.roster(), options);
        stats.aggregates_written = aggregates.len() as u32;

        DayOutput {
            date,
            results,
            aggregates,
            stats,
        }
    }

    /// Upsert the day into the rolling index, prune old history, then merge
    /// row-level output into the editable store.
    pub fn commit(
        &self,
        output: &mut DayOutput,
        index_store: &dyn IndexStore,
        editable: &dyn EditableStore,
    ) -> Result<()> {
        let index = RollingIndex::from_rows(index_store.load().context("Failed to load rolling index")?);
        let mut index = index.upsert(output.date, output.aggregates.clone());
        if let Some(days) = self.retention.keep_days {
            let reference = index.latest_date().map_or(output.date, |d| d.max(output.date));
            match Duration::try_days(days).and_then(|w| reference.checked_sub_signed(w)) {
                Some(cutoff) => {
                    // A backfilled day older than the window is kept.
                    let cutoff = cutoff.min(output.date);
                    let (pruned, removed) = index.prune_before(cutoff);
                    if removed > 0 {
                        info!(removed, keep_days = days, %cutoff, "Pruned rolling index");
                    }
                    output.stats.index_rows_pruned = removed as u32;
                    index = pruned;
                }
                None => warn!(keep_days = days, "Retention window out of range, index not pruned"),
            }
        }
        index_store
            .save(index.rows())
            .context("Failed to save rolling index")?;

        let tab = self.tab_name(output.date);
        let stored = editable
            .read(&tab)
            .with_context(|| format!("Failed to read editable tab {tab}"))?;
        let merged = merge(&results_table(&output.results), &stored, KEY_FIELD, PROTECTED_FIELDS);
        editable
            .write(&tab, &merged.table)
            .with_context(|| format!("Failed to write editable tab {tab}"))?;

        output.stats.editable_matched = merged.matched as u32;
        output.stats.editable_edits_preserved = merged.edits_preserved as u32;
        output.stats.editable_orphans_kept = merged.orphans_kept as u32;
        Ok(())
    }

    /// Load and transform one date without writing anything. `Ok(None)` when
    /// the source has nothing for the date.
    pub fn prepare_day(
        &self,
        date: NaiveDate,
        source: &dyn ResultSource,
        editable: &dyn EditableStore,
    ) -> Result<Option<DayOutput>> {
        let Some(raw) = source
            .day(date, &self.context_name)
            .with_context(|| format!("Failed to read raw results for {date}"))?
        else {
            info!(%date, context = self.context_name.as_str(), "No raw results for date, skipping");
            return Ok(None);
        };

        let stored_edits = if self.context.aggregate_edited {
            Some(editable.read(&self.tab_name(date))?)
        } else {
            None
        };
        Ok(Some(self.transform(date, raw, stored_edits.as_ref())))
    }

    /// Run one date end to end. `Ok(None)` when the source has nothing for
    /// the date; no store is touched in that case.
    pub fn process_day(
        &self,
        date: NaiveDate,
        source: &dyn ResultSource,
        index_store: &dyn IndexStore,
        editable: &dyn EditableStore,
    ) -> Result<Option<DayOutput>> {
        let Some(mut output) = self.prepare_day(date, source, editable)? else {
            return Ok(None);
        };
        self.commit(&mut output, index_store, editable)?;
        info!(
            %date,
            context = self.context_name.as_str(),
            rows = output.results.len(),
            aggregates = output.aggregates.len(),
            "Day processed"
        );
        Ok(Some(output))
    }
}
