use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::info;

use mediapulse_common::config::AlertsConfig;
use mediapulse_common::{AlertCandidate, DailyAggregate};

/// Entities whose negative share reaches the threshold. Days with no rows
/// never qualify.
pub fn alert_candidates(aggregates: &[DailyAggregate], threshold: f64) -> Vec<AlertCandidate> {
    aggregates
        .iter()
        .filter(|a| a.total > 0 && a.negative_ratio() >= threshold)
        .map(|a| AlertCandidate {
            entity_name: a.entity.display_name(),
            negative_count: a.negative,
            total_count: a.total,
        })
        .collect()
}

/// Last alert date per `"{context}:{entity}"`, used to hold back repeats
/// inside the cooldown window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertLedger {
    last_sent: BTreeMap<String, NaiveDate>,
}

impl AlertLedger {
    pub fn new(last_sent: BTreeMap<String, NaiveDate>) -> Self {
        Self { last_sent }
    }

    pub fn key(context: &str, entity_name: &str) -> String {
        format!("{context}:{entity_name}")
    }

    /// Keep candidates outside their cooldown as of `today`.
    pub fn due(
        &self,
        context: &str,
        candidates: Vec<AlertCandidate>,
        today: NaiveDate,
        config: &AlertsConfig,
    ) -> Vec<AlertCandidate> {
        candidates
            .into_iter()
            .filter(|c| match self.last_sent.get(&Self::key(context, &c.entity_name)) {
                Some(last) => (today - *last).num_days() >= config.cooldown_days,
                None => true,
            })
            .collect()
    }

    pub fn record(&mut self, context: &str, sent: &[AlertCandidate], today: NaiveDate) {
        for c in sent {
            self.last_sent.insert(Self::key(context, &c.entity_name), today);
        }
        if !sent.is_empty() {
            info!(context, count = sent.len(), %today, "Recorded alert dates");
        }
    }

    pub fn entries(&self) -> &BTreeMap<String, NaiveDate> {
        &self.last_sent
    }
}
