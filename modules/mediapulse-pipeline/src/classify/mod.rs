//! Per-row classification: sentiment label plus controlled/uncontrolled flag.
//!
//! The two decisions are computed independently. The optional
//! controlled-forces-positive override runs only after both exist.

pub mod control;
pub mod lexicon;
pub mod sentiment;

use std::sync::Arc;

use chrono::NaiveDate;

use mediapulse_common::config::{ContextConfig, ControlConfig, SentimentConfig, TextSource};
use mediapulse_common::{host_of, ClassifiedResult, EntityKey, RawResult, Sentiment};

pub use control::{ControlChain, ControlDecision, ControlInput, ControlRule};
pub use lexicon::LexiconScorer;
pub use sentiment::{Neutralizer, SentimentScorer, Thresholds};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentDecision {
    pub label: Sentiment,
    pub compound: f64,
}

pub struct Classifier {
    scorer: Arc<dyn SentimentScorer>,
    neutralizer: Neutralizer,
    thresholds: Thresholds,
    text_source: TextSource,
    force_positive_if_controlled: bool,
    chain: ControlChain,
}

impl Classifier {
    pub fn new(
        context: &ContextConfig,
        control: &ControlConfig,
        sentiment: &SentimentConfig,
        scorer: Arc<dyn SentimentScorer>,
    ) -> Self {
        Self {
            scorer,
            neutralizer: Neutralizer::new(&sentiment.neutralize),
            thresholds: Thresholds::from_context(context),
            text_source: context.text_source,
            force_positive_if_controlled: context.force_positive_if_controlled,
            chain: ControlChain::new(control),
        }
    }

    /// Score `text` after neutralizing configured terms. Blank text is
    /// neutral without consulting the scorer.
    pub fn sentiment(&self, text: &str) -> SentimentDecision {
        let cleaned = self.neutralizer.apply(text);
        if cleaned.trim().is_empty() {
            return SentimentDecision {
                label: Sentiment::Neutral,
                compound: 0.0,
            };
        }
        let compound = self.scorer.compound(&cleaned);
        let compound = if compound.is_finite() {
            compound.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        SentimentDecision {
            label: self.thresholds.label(compound),
            compound,
        }
    }

    pub fn control(
        &self,
        raw: &RawResult,
        entity: Option<&EntityKey>,
        owned_domains: &[String],
    ) -> ControlDecision {
        let parsed = url::Url::parse(raw.url.trim()).ok();
        let mut host = host_of(&raw.url);
        if host.is_empty() {
            let domain = raw.domain.trim().to_lowercase();
            host = domain.strip_prefix("www.").unwrap_or(&domain).to_string();
        }
        let path = parsed.as_ref().map(|u| u.path()).unwrap_or("");
        self.chain.decide(&ControlInput {
            host: &host,
            path,
            position: raw.position,
            entity,
            owned_domains,
        })
    }

    fn scored_text(&self, raw: &RawResult) -> String {
        let snippet = raw.snippet.as_deref().unwrap_or("").trim();
        match self.text_source {
            TextSource::Title => raw.title.clone(),
            TextSource::Snippet if !snippet.is_empty() => snippet.to_string(),
            TextSource::Snippet => raw.title.clone(),
            TextSource::TitleAndSnippet => format!("{} {}", raw.title, snippet),
        }
    }

    /// Classify one resolved (or unresolved) result.
    pub fn classify(
        &self,
        date: NaiveDate,
        raw: RawResult,
        entity: Option<EntityKey>,
        owned_domains: &[String],
    ) -> ClassifiedResult {
        let sentiment = self.sentiment(&self.scored_text(&raw));
        let control = self.control(&raw, entity.as_ref(), owned_domains);

        let label = if control.controlled && self.force_positive_if_controlled {
            Sentiment::Positive
        } else {
            sentiment.label
        };

        ClassifiedResult {
            date,
            raw,
            entity,
            sentiment: label,
            controlled: control.controlled,
            compound: sentiment.compound,
        }
    }
}
