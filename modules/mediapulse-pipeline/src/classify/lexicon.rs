//! Built-in lexicon scorer.
//!
//! A small valence lexicon with the usual compound normalization
//! `sum / sqrt(sum^2 + 15)`. Production runs may plug a fuller scorer in
//! through [`SentimentScorer`]; this one keeps the binary self-contained.

use std::collections::HashMap;

use crate::classify::sentiment::SentimentScorer;

const NORMALIZATION_ALPHA: f64 = 15.0;
const NEGATION_SCALAR: f64 = -0.74;
const NEGATION_WINDOW: usize = 3;
const BOOSTER_INCREMENT: f64 = 0.293;

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "without", "nor", "none", "nobody", "nothing", "neither", "cannot",
    "dont", "doesnt", "didnt", "isnt", "wasnt", "arent", "wont", "cant",
];

const BOOSTERS: &[&str] = &[
    "very", "extremely", "highly", "hugely", "deeply", "really", "major", "massive", "huge",
];

const VALENCE: &[(&str, f64)] = &[
    // positive
    ("award", 2.5),
    ("awarded", 2.4),
    ("wins", 2.7),
    ("win", 2.8),
    ("won", 2.7),
    ("success", 2.7),
    ("successful", 2.8),
    ("growth", 1.6),
    ("gains", 1.7),
    ("record", 0.9),
    ("praise", 2.6),
    ("praised", 2.2),
    ("best", 3.2),
    ("great", 3.1),
    ("good", 1.9),
    ("strong", 2.3),
    ("innovative", 2.1),
    ("leading", 1.4),
    ("honored", 2.4),
    ("celebrates", 2.7),
    ("surge", 1.3),
    ("soars", 1.9),
    ("boost", 1.7),
    ("breakthrough", 2.3),
    ("beats", 1.2),
    ("profit", 1.9),
    ("recovery", 1.4),
    ("approve", 1.9),
    ("approved", 1.8),
    ("support", 1.7),
    ("partnership", 1.3),
    ("upgrade", 1.5),
    ("love", 3.2),
    ("trust", 2.3),
    // negative
    ("scandal", -2.3),
    ("lawsuit", -1.8),
    ("sued", -1.9),
    ("sues", -1.6),
    ("fraud", -2.8),
    ("probe", -1.2),
    ("investigation", -1.4),
    ("crisis", -3.1),
    ("layoffs", -1.9),
    ("fired", -2.6),
    ("ousted", -2.1),
    ("resigns", -1.3),
    ("resign", -1.4),
    ("loss", -1.3),
    ("losses", -1.5),
    ("decline", -1.3),
    ("plunge", -1.9),
    ("plunges", -2.0),
    ("slump", -1.7),
    ("falls", -1.2),
    ("fails", -2.1),
    ("failure", -2.3),
    ("criticism", -1.9),
    ("criticized", -1.9),
    ("backlash", -1.8),
    ("controversy", -1.7),
    ("accused", -1.9),
    ("allegations", -1.7),
    ("misconduct", -2.2),
    ("bad", -2.5),
    ("worst", -3.1),
    ("weak", -1.9),
    ("warning", -1.4),
    ("fined", -1.8),
    ("penalty", -1.7),
    ("recall", -1.4),
    ("breach", -2.0),
    ("hack", -1.6),
    ("strike", -1.1),
    ("bankruptcy", -2.6),
    ("downgrade", -1.7),
    ("concerns", -1.4),
    ("risk", -1.1),
    ("toxic", -2.5),
];

/// Lexicon-based compound scorer. Extra entries from configuration are
/// merged in at construction and never change afterwards.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    valence: HashMap<String, f64>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new(std::iter::empty::<(&str, f64)>())
    }
}

impl LexiconScorer {
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut valence: HashMap<String, f64> = VALENCE
            .iter()
            .map(|(w, v)| (w.to_string(), *v))
            .collect();
        for (word, v) in extra {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() {
                valence.insert(word, v);
            }
        }
        Self { valence }
    }

    fn tokens(text: &str) -> Vec<String> {
        text.split_whitespace()
            .map(|t| {
                t.chars()
                    .filter(|c| c.is_alphanumeric())
                    .flat_map(char::to_lowercase)
                    .collect::<String>()
            })
            .filter(|t| !t.is_empty())
            .collect()
    }
}

impl SentimentScorer for LexiconScorer {
    fn compound(&self, text: &str) -> f64 {
        let tokens = Self::tokens(text);
        let mut sum = 0.0;
        for (i, token) in tokens.iter().enumerate() {
            let Some(&base) = self.valence.get(token) else {
                continue;
            };
            let mut v = base;
            let window = &tokens[i.saturating_sub(NEGATION_WINDOW)..i];
            if window
                .last()
                .is_some_and(|prev| BOOSTERS.contains(&prev.as_str()))
            {
                v += BOOSTER_INCREMENT * v.signum();
            }
            if window.iter().any(|t| NEGATIONS.contains(&t.as_str())) {
                v *= NEGATION_SCALAR;
            }
            sum += v;
        }
        if sum == 0.0 {
            return 0.0;
        }
        (sum / (sum * sum + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
    }
}
