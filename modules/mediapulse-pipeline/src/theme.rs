//! Short phrase summarizing an entity's negative headlines for a day.
//!
//! Tiers, first non-empty wins:
//! 1. most frequent 2-3 word phrase found in at least two titles
//! 2. most frequent 2-word phrase found in any title
//! 3. the top single words
//!
//! Stopwords are dropped before phrases are formed. Equal counts resolve to
//! the alphabetically first candidate so output is stable across runs.

use std::collections::{BTreeMap, HashSet};

use mediapulse_common::config::ThemeConfig;
use mediapulse_common::{normalize, EntityKey};

/// Returned when there is nothing to summarize.
pub const NO_THEME: &str = "None";

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "may", "me",
    "more", "most", "my", "new", "no", "nor", "not", "now", "of", "off", "on", "once", "only",
    "or", "other", "our", "out", "over", "own", "said", "says", "same", "she", "should", "so",
    "some", "such", "than", "that", "the", "their", "them", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "under", "until", "up", "us", "very", "was", "we",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "would", "you", "your",
];

pub struct ThemeExtractor {
    extra_stopwords: HashSet<String>,
    role_token: String,
    max_words: usize,
    keyword_fallback: usize,
}

impl ThemeExtractor {
    pub fn new(config: &ThemeConfig) -> Self {
        Self {
            extra_stopwords: config
                .extra_stopwords
                .iter()
                .flat_map(|w| normalize(w).split(' ').map(String::from).collect::<Vec<_>>())
                .filter(|w| !w.is_empty())
                .collect(),
            role_token: normalize(&config.role_token),
            max_words: config.max_words.max(1),
            keyword_fallback: config.keyword_fallback.max(1),
        }
    }

    fn stopwords(&self, entity: &EntityKey) -> HashSet<String> {
        let mut stop: HashSet<String> = STOPWORDS.iter().map(|w| w.to_string()).collect();
        stop.extend(self.extra_stopwords.iter().cloned());
        for name in [&entity.person, &entity.organization] {
            stop.extend(normalize(name).split_whitespace().map(String::from));
        }
        if !self.role_token.is_empty() {
            stop.extend(self.role_token.split_whitespace().map(String::from));
        }
        stop
    }

    /// Summarize `titles` (the negative rows of one entity-day).
    pub fn extract(&self, titles: &[&str], entity: &EntityKey) -> String {
        let stop = self.stopwords(entity);
        let docs: Vec<Vec<String>> = titles
            .iter()
            .map(|t| {
                normalize(t)
                    .split(' ')
                    .filter(|w| w.chars().count() >= 2 && !stop.contains(*w))
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|d| !d.is_empty())
            .collect();
        if docs.is_empty() {
            return NO_THEME.to_string();
        }

        let phrase = top_phrase(&docs, 2..=3, 2).or_else(|| top_phrase(&docs, 2..=2, 1));
        let theme = match phrase {
            Some(p) => p,
            None => top_words(&docs, self.keyword_fallback).join(" "),
        };
        let capped: Vec<&str> = theme.split(' ').take(self.max_words).collect();
        if capped.is_empty() || capped.iter().all(|w| w.is_empty()) {
            NO_THEME.to_string()
        } else {
            capped.join(" ")
        }
    }
}

/// Count `n`-grams for every `n` in `sizes`; return the highest-count one
/// appearing in at least `min_docs` titles.
fn top_phrase(docs: &[Vec<String>], sizes: std::ops::RangeInclusive<usize>, min_docs: usize) -> Option<String> {
    // phrase -> (occurrences, documents)
    let mut counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for doc in docs {
        let mut seen: HashSet<String> = HashSet::new();
        for n in sizes.clone() {
            for gram in doc.windows(n) {
                let phrase = gram.join(" ");
                let entry = counts.entry(phrase.clone()).or_default();
                entry.0 += 1;
                if seen.insert(phrase) {
                    entry.1 += 1;
                }
            }
        }
    }
    best_by_count(
        counts
            .into_iter()
            .filter(|(_, (_, df))| *df >= min_docs)
            .map(|(p, (c, _))| (p, c)),
    )
}

/// Highest count wins; the iterator is in ascending key order, so keeping
/// only strictly greater counts resolves ties alphabetically.
fn best_by_count(items: impl Iterator<Item = (String, usize)>) -> Option<String> {
    let mut best: Option<(String, usize)> = None;
    for (phrase, count) in items {
        if best.as_ref().map_or(true, |(_, c)| count > *c) {
            best = Some((phrase, count));
        }
    }
    best.map(|(p, _)| p)
}

fn top_words(docs: &[Vec<String>], k: usize) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for word in docs.iter().flatten() {
        *counts.entry(word.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    // Highest count first; equal counts take the later word.
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(a.0)));
    ranked.into_iter().take(k).map(|(w, _)| w.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ThemeExtractor {
        ThemeExtractor::new(&ThemeConfig::default())
    }

    fn jane() -> EntityKey {
        EntityKey::new("Jane Doe", "Acme Corp")
    }

    #[test]
    fn no_titles_yields_none() {
        assert_eq!(extractor().extract(&[], &jane()), NO_THEME);
        assert_eq!(extractor().extract(&["Jane Doe, CEO of Acme"], &jane()), NO_THEME);
    }

    #[test]
    fn single_title_falls_to_bigram_tier() {
        let theme = extractor().extract(&["Jane Doe scandal rocks Acme"], &jane());
        assert_eq!(theme, "scandal rocks");
    }

    #[test]
    fn shared_phrase_across_titles_wins() {
        let titles = [
            "Acme accounting probe widens",
            "Regulators open accounting probe into Acme",
            "Jane Doe faces shareholder anger",
        ];
        assert_eq!(extractor().extract(&titles, &jane()), "accounting probe");
    }

    #[test]
    fn unigram_fallback_when_no_bigrams() {
        let titles = ["Layoffs", "Layoffs!", "Lawsuit"];
        assert_eq!(extractor().extract(&titles, &jane()), "layoffs lawsuit");
    }

    #[test]
    fn entity_and_role_tokens_are_stopwords() {
        let theme = extractor().extract(&["CEO Jane Doe Acme Corp ousted"], &jane());
        assert_eq!(theme, "ousted");
    }

    #[test]
    fn output_is_capped() {
        let config = ThemeConfig {
            max_words: 1,
            ..ThemeConfig::default()
        };
        let theme = ThemeExtractor::new(&config).extract(&["Jane Doe scandal rocks Acme"], &jane());
        assert_eq!(theme, "scandal");
    }

    #[test]
    fn unigram_ties_take_later_words() {
        let titles = ["delta", "alpha", "gamma", "beta"];
        assert_eq!(extractor().extract(&titles, &jane()), "gamma delta beta");
    }

    #[test]
    fn equal_counts_break_alphabetically() {
        let titles = ["zeta alpha", "beta gamma"];
        assert_eq!(extractor().extract(&titles, &jane()), "beta gamma");
    }
}
