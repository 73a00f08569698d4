use regex::{Regex, RegexBuilder};
use tracing::warn;

use mediapulse_common::config::ContextConfig;
use mediapulse_common::Sentiment;

/// Black-box lexicon scorer: text in, compound score in `[-1, 1]` out.
/// Implementations hold no per-call state and are shared across rows.
pub trait SentimentScorer: Send + Sync {
    fn compound(&self, text: &str) -> f64;
}

/// Strips configured terms from text before it reaches the scorer, so brand
/// names like "Best Buy" or "Green Giant" do not read as sentiment.
#[derive(Debug, Clone, Default)]
pub struct Neutralizer {
    patterns: Vec<Regex>,
}

impl Neutralizer {
    pub fn new(terms: &[String]) -> Self {
        let mut patterns = Vec::new();
        for term in terms {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }
            let pattern = boundary_pattern(term);
            match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                Ok(re) => patterns.push(re),
                Err(e) => warn!(term, error = %e, "Skipping neutralize term"),
            }
        }
        Self { patterns }
    }

    pub fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        for re in &self.patterns {
            out = re.replace_all(&out, " ").into_owned();
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// `\b` only anchors against a word character, so it is added at an end of
/// the term only when that end is one.
fn boundary_pattern(term: &str) -> String {
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let lead = if is_word(term.chars().next()) { r"\b" } else { "" };
    let trail = if is_word(term.chars().last()) { r"\b" } else { "" };
    format!("{lead}{}{trail}", regex::escape(term))
}

/// Positive/negative cutoffs for one classification context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub positive: f64,
    pub negative: f64,
}

impl Thresholds {
    pub fn from_context(ctx: &ContextConfig) -> Self {
        Self {
            positive: ctx.positive_threshold,
            negative: ctx.negative_threshold,
        }
    }

    pub fn label(&self, compound: f64) -> Sentiment {
        if compound >= self.positive {
            Sentiment::Positive
        } else if compound <= self.negative {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_inclusive() {
        let t = Thresholds {
            positive: 0.05,
            negative: -0.05,
        };
        assert_eq!(t.label(0.05), Sentiment::Positive);
        assert_eq!(t.label(-0.05), Sentiment::Negative);
        assert_eq!(t.label(0.0), Sentiment::Neutral);
    }

    #[test]
    fn same_score_labels_differently_per_context() {
        let news = Thresholds::from_context(&ContextConfig::default());
        let serp = Thresholds::from_context(&ContextConfig::serp());
        assert_eq!(news.label(0.1), Sentiment::Positive);
        assert_eq!(serp.label(0.1), Sentiment::Neutral);
    }

    #[test]
    fn neutralizer_strips_whole_terms_case_insensitively() {
        let n = Neutralizer::new(&["Best Buy".to_string(), "".to_string()]);
        assert_eq!(n.apply("BEST BUY earnings beat").trim(), "earnings beat");
        assert_eq!(n.apply("bestbuyer"), "bestbuyer");
    }

    #[test]
    fn neutralizer_matches_terms_ending_in_punctuation() {
        let n = Neutralizer::new(&["Yahoo!".to_string(), "A+".to_string()]);
        assert_eq!(n.apply("Yahoo! Finance rallies").trim(), "Finance rallies");
        assert_eq!(n.apply("Acme rated A+ again").split_whitespace().collect::<Vec<_>>(), vec!["Acme", "rated", "again"]);
        assert_eq!(n.apply("BA+ grade"), "BA+ grade");
    }

    #[test]
    fn neutralizer_escapes_metacharacters() {
        let n = Neutralizer::new(&["A+ Rated".to_string()]);
        assert_eq!(n.apply("Acme A+ Rated again").split_whitespace().collect::<Vec<_>>(), vec!["Acme", "again"]);
    }
}
