use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PulseError;
use crate::table::{cell, Row};

// --- Identity ---

/// Canonical identity of a tracked person/organization pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub person: String,
    /// Empty only for brand-only tracking.
    #[serde(default)]
    pub organization: String,
}

impl EntityKey {
    pub fn new(person: impl Into<String>, organization: impl Into<String>) -> Self {
        Self {
            person: person.into().trim().to_string(),
            organization: organization.into().trim().to_string(),
        }
    }

    /// Name used in summaries and alert keys.
    pub fn display_name(&self) -> String {
        if self.organization.is_empty() {
            self.person.clone()
        } else {
            format!("{} ({})", self.person, self.organization)
        }
    }

    /// The auto-generated alias `"{person} {organization}"`.
    pub fn default_alias(&self) -> String {
        format!("{} {}", self.person, self.organization)
            .trim()
            .to_string()
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

// --- Sentiment ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    /// Lenient parse of stored or hand-edited labels. Unknown values are
    /// neutral.
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pos" | "positive" | "1" => Sentiment::Positive,
            "neg" | "negative" | "-1" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient parse of a controlled flag cell.
pub fn parse_controlled(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "t" | "yes" | "y" | "controlled"
    )
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, PulseError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| PulseError::InvalidDate(raw.to_string()))
}

// --- Rows ---

/// One search result or headline as delivered by the fetch layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    pub query_alias: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub published: Option<String>,
}

/// A raw result with identity, sentiment and control attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedResult {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub raw: RawResult,
    /// `None` when the alias could not be resolved.
    pub entity: Option<EntityKey>,
    pub sentiment: Sentiment,
    pub controlled: bool,
    /// Scorer output before thresholds and overrides.
    pub compound: f64,
}

/// Column order of classified rows in the editable store.
pub const RESULT_COLUMNS: &[&str] = &[
    "date",
    "person",
    "organization",
    "query_alias",
    "title",
    "url",
    "domain",
    "position",
    "snippet",
    "published",
    "sentiment",
    "controlled",
    "compound",
];

impl ClassifiedResult {
    pub fn to_row(&self) -> Row {
        let (person, organization) = match &self.entity {
            Some(e) => (e.person.clone(), e.organization.clone()),
            None => (String::new(), String::new()),
        };
        let values = [
            self.date.format("%Y-%m-%d").to_string(),
            person,
            organization,
            self.raw.query_alias.clone(),
            self.raw.title.clone(),
            self.raw.url.clone(),
            self.raw.domain.clone(),
            self.raw.position.map(|p| p.to_string()).unwrap_or_default(),
            self.raw.snippet.clone().unwrap_or_default(),
            self.raw.published.clone().unwrap_or_default(),
            self.sentiment.as_str().to_string(),
            self.controlled.to_string(),
            format!("{:.4}", self.compound),
        ];
        RESULT_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .zip(values)
            .collect()
    }

    /// Rebuild from a stored row. Missing or malformed cells fall back to
    /// neutral, uncontrolled and unresolved rather than failing.
    pub fn from_row(row: &Row, fallback_date: NaiveDate) -> Self {
        let person = cell(row, "person");
        let entity = (!person.is_empty()).then(|| EntityKey::new(person, cell(row, "organization")));
        let opt = |c: &str| Some(cell(row, c).to_string()).filter(|v| !v.is_empty());
        Self {
            date: parse_date(cell(row, "date")).unwrap_or(fallback_date),
            raw: RawResult {
                query_alias: cell(row, "query_alias").to_string(),
                title: cell(row, "title").to_string(),
                url: cell(row, "url").to_string(),
                snippet: opt("snippet"),
                position: parse_position(cell(row, "position")),
                domain: cell(row, "domain").to_string(),
                published: opt("published"),
            },
            entity,
            sentiment: Sentiment::from_label(cell(row, "sentiment")),
            controlled: parse_controlled(cell(row, "controlled")),
            compound: cell(row, "compound").parse().unwrap_or(0.0),
        }
    }
}

/// Whole non-negative rank. Spreadsheet exports may write `1.0`; fractional
/// or negative values are dropped rather than rounded.
fn parse_position(raw: &str) -> Option<u32> {
    if let Ok(p) = raw.parse::<u32>() {
        return Some(p);
    }
    let p = raw.parse::<f64>().ok()?;
    (p.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&p)).then_some(p as u32)
}

// --- Aggregates ---

/// Per-entity sentiment counts for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub entity: EntityKey,
    pub total: u32,
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controlled_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl DailyAggregate {
    /// All-zero row for an entity with no activity on `date`.
    pub fn zero(date: NaiveDate, entity: EntityKey) -> Self {
        Self {
            date,
            entity,
            total: 0,
            positive: 0,
            neutral: 0,
            negative: 0,
            controlled_count: None,
            theme: None,
        }
    }

    /// Count one labelled row. Keeps `total == positive + neutral + negative`.
    pub fn tally(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
        self.total += 1;
    }

    pub fn key(&self) -> (NaiveDate, &EntityKey) {
        (self.date, &self.entity)
    }

    pub fn is_consistent(&self) -> bool {
        self.total == self.positive + self.neutral + self.negative
    }

    /// Share of negative rows; 0.0 when there are none.
    pub fn negative_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.negative as f64 / self.total as f64
        }
    }
}

/// Negative/total pair handed to the alerting collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCandidate {
    pub entity_name: String,
    pub negative_count: u32,
    pub total_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 15).unwrap()
    }

    #[test]
    fn sentiment_labels_parse_leniently() {
        assert_eq!(Sentiment::from_label("POS"), Sentiment::Positive);
        assert_eq!(Sentiment::from_label(" -1 "), Sentiment::Negative);
        assert_eq!(Sentiment::from_label("0"), Sentiment::Neutral);
        assert_eq!(Sentiment::from_label("meh"), Sentiment::Neutral);
    }

    #[test]
    fn controlled_flag_parses_leniently() {
        assert!(parse_controlled("TRUE"));
        assert!(parse_controlled("controlled"));
        assert!(!parse_controlled("uncontrolled"));
        assert!(!parse_controlled(""));
    }

    #[test]
    fn tally_keeps_count_invariant() {
        let mut agg = DailyAggregate::zero(day(), EntityKey::new("Jane Doe", "Acme Corp"));
        for s in [Sentiment::Positive, Sentiment::Negative, Sentiment::Negative, Sentiment::Neutral] {
            agg.tally(s);
        }
        assert!(agg.is_consistent());
        assert_eq!(agg.total, 4);
        assert!((agg.negative_ratio() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn classified_row_survives_store_round_trip() {
        let result = ClassifiedResult {
            date: day(),
            raw: RawResult {
                query_alias: "Jane Doe Acme Corp".into(),
                title: "Jane Doe wins award".into(),
                url: "https://acme.com/news".into(),
                snippet: None,
                position: Some(3),
                domain: "acme.com".into(),
                published: None,
            },
            entity: Some(EntityKey::new("Jane Doe", "Acme Corp")),
            sentiment: Sentiment::Positive,
            controlled: true,
            compound: 0.5,
        };
        let back = ClassifiedResult::from_row(&result.to_row(), day());
        assert_eq!(back, result);
    }

    #[test]
    fn from_row_defaults_malformed_cells() {
        let row: Row = [("url".to_string(), "u1".to_string()), ("sentiment".to_string(), "??".to_string())]
            .into_iter()
            .collect();
        let parsed = ClassifiedResult::from_row(&row, day());
        assert_eq!(parsed.entity, None);
        assert_eq!(parsed.sentiment, Sentiment::Neutral);
        assert!(!parsed.controlled);
        assert_eq!(parsed.date, day());
    }

    #[test]
    fn stored_position_accepts_only_whole_ranks() {
        let with_position = |p: &str| -> Row {
            [("url", "u1"), ("position", p)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        let position = |p: &str| ClassifiedResult::from_row(&with_position(p), day()).raw.position;
        assert_eq!(position("3"), Some(3));
        assert_eq!(position("1.0"), Some(1));
        assert_eq!(position("1.9"), None);
        assert_eq!(position("-1"), None);
        assert_eq!(position(""), None);
    }

    #[test]
    fn aggregate_serializes_flat_entity() {
        let agg = DailyAggregate::zero(day(), EntityKey::new("Jane Doe", "Acme Corp"));
        let json = serde_json::to_value(&agg).unwrap();
        assert_eq!(json["person"], "Jane Doe");
        assert_eq!(json["date"], "2025-09-15");
        assert!(json.get("theme").is_none());
    }
}
