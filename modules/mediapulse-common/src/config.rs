use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::error::PulseError;

pub const ENV_CONFIG_PATH: &str = "MEDIAPULSE_CONFIG";
pub const ENV_DATA_DIR: &str = "MEDIAPULSE_DATA_DIR";
pub const DEFAULT_CONFIG_PATH: &str = "mediapulse.toml";

/// Upper bound for day-count windows (retention, alert cooldown): 100 years.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// TOML-backed configuration loaded from disk. Every section has defaults,
/// so an empty file is a valid configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FileConfig {
    pub paths: PathsConfig,
    /// Classification context name ("serp", "news", ...) -> its policy.
    pub contexts: BTreeMap<String, ContextConfig>,
    pub control: ControlConfig,
    pub sentiment: SentimentConfig,
    pub theme: ThemeConfig,
    pub intake: IntakeConfig,
    pub alerts: AlertsConfig,
    pub retention: RetentionConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        let mut contexts = BTreeMap::new();
        contexts.insert("serp".to_string(), ContextConfig::serp());
        contexts.insert("news".to_string(), ContextConfig::default());
        Self {
            paths: PathsConfig::default(),
            contexts,
            control: ControlConfig::default(),
            sentiment: SentimentConfig::default(),
            theme: ThemeConfig::default(),
            intake: IntakeConfig::default(),
            alerts: AlertsConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    /// Roster table: person, organization, website.
    pub roster: PathBuf,
    /// Explicit alias table: alias, person, organization. Optional on disk.
    pub aliases: PathBuf,
    /// Directory of `{date}-{context}.jsonl` raw result files.
    pub raw_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            roster: PathBuf::from("rosters/roster.json"),
            aliases: PathBuf::from("rosters/aliases.json"),
            raw_dir: PathBuf::from("data/raw"),
        }
    }
}

impl PathsConfig {
    pub fn rolling_index(&self, context: &str) -> PathBuf {
        self.data_dir.join(format!("{context}-daily-index.json"))
    }

    pub fn daily_aggregates_dir(&self) -> PathBuf {
        self.data_dir.join("daily")
    }

    pub fn editable_dir(&self) -> PathBuf {
        self.data_dir.join("editable")
    }

    pub fn alerts_dir(&self) -> PathBuf {
        self.data_dir.join("alerts")
    }

    pub fn alert_ledger(&self) -> PathBuf {
        self.data_dir.join("last_alert_dates.json")
    }
}

/// Which text of a result feeds the sentiment scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    #[default]
    Title,
    Snippet,
    TitleAndSnippet,
}

/// Per-context classification policy. Thresholds and the controlled override
/// differ between headline and search-result use, so none of this is global.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ContextConfig {
    /// `compound >= positive_threshold` labels positive.
    pub positive_threshold: f64,
    /// `compound <= negative_threshold` labels negative.
    pub negative_threshold: f64,
    pub text_source: TextSource,
    /// Controlled results are relabelled positive after classification.
    pub force_positive_if_controlled: bool,
    /// Run the theme extractor on each entity's negative rows.
    pub extract_theme: bool,
    /// Record `controlled_count` on aggregates.
    pub count_controlled: bool,
    /// Apply stored hand edits to fresh rows before aggregating.
    pub aggregate_edited: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            positive_threshold: 0.05,
            negative_threshold: -0.05,
            text_source: TextSource::Title,
            force_positive_if_controlled: false,
            extract_theme: true,
            count_controlled: false,
            aggregate_edited: false,
        }
    }
}

impl ContextConfig {
    /// Search-result defaults: wider positive band, owned results forced positive.
    pub fn serp() -> Self {
        Self {
            positive_threshold: 0.2,
            negative_threshold: -0.1,
            force_positive_if_controlled: true,
            extract_theme: false,
            count_controlled: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ControlConfig {
    /// Hosts never counted as controlled, even when they contain the entity name.
    pub always_uncontrolled: Vec<String>,
    /// Social and platform hosts always counted as controlled.
    pub always_controlled: Vec<String>,
    /// URL path fragments that mark an entity-owned page.
    pub path_keywords: Vec<String>,
    pub top_position_controlled: bool,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            always_uncontrolled: vec!["wikipedia.org".into()],
            always_controlled: [
                "facebook.com",
                "instagram.com",
                "twitter.com",
                "x.com",
                "linkedin.com",
                "play.google.com",
                "apps.apple.com",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            path_keywords: vec!["/leadership/".into(), "/about/".into(), "/governance/".into()],
            top_position_controlled: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SentimentConfig {
    /// Terms or phrases removed from text before scoring (brand names such as
    /// "Best Buy" that read as sentiment).
    pub neutralize: Vec<String>,
    /// Extra lexicon entries, word -> valence. Fixed once the scorer is built.
    pub lexicon: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ThemeConfig {
    pub extra_stopwords: Vec<String>,
    pub role_token: String,
    pub max_words: usize,
    pub keyword_fallback: usize,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            extra_stopwords: Vec::new(),
            role_token: "ceo".into(),
            max_words: 10,
            keyword_fallback: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct IntakeConfig {
    /// Low-signal hosts dropped before classification.
    pub blocked_domains: Vec<String>,
    pub max_per_alias: Option<usize>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            blocked_domains: [
                "prnewswire.com",
                "businesswire.com",
                "globenewswire.com",
                "investorplace.com",
                "seekingalpha.com",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_per_alias: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AlertsConfig {
    pub negative_ratio_threshold: f64,
    pub cooldown_days: i64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            negative_ratio_threshold: 0.4,
            cooldown_days: 180,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RetentionConfig {
    /// Days of rolling-index history kept; `None` keeps everything.
    pub keep_days: Option<i64>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { keep_days: Some(365) }
    }
}

impl FileConfig {
    /// Parse from a TOML string and validate.
    pub fn from_toml(content: &str) -> Result<Self, PulseError> {
        let config: FileConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would silently misclassify every row.
    pub fn validate(&self) -> Result<(), PulseError> {
        if self.contexts.is_empty() {
            return Err(PulseError::Config("at least one [contexts.<name>] section is required".into()));
        }
        for (name, ctx) in &self.contexts {
            for (label, v) in [("positive_threshold", ctx.positive_threshold), ("negative_threshold", ctx.negative_threshold)] {
                if !(-1.0..=1.0).contains(&v) {
                    return Err(PulseError::Config(format!("contexts.{name}.{label} = {v} is outside [-1, 1]")));
                }
            }
            if ctx.positive_threshold < ctx.negative_threshold {
                return Err(PulseError::Config(format!(
                    "contexts.{name}: positive_threshold {} is below negative_threshold {}",
                    ctx.positive_threshold, ctx.negative_threshold
                )));
            }
        }
        if self.theme.max_words == 0 {
            return Err(PulseError::Config("theme.max_words must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.alerts.negative_ratio_threshold) {
            return Err(PulseError::Config("alerts.negative_ratio_threshold must be within [0, 1]".into()));
        }
        if !(0..=MAX_WINDOW_DAYS).contains(&self.alerts.cooldown_days) {
            return Err(PulseError::Config(format!(
                "alerts.cooldown_days = {} must be within [0, {MAX_WINDOW_DAYS}]",
                self.alerts.cooldown_days
            )));
        }
        if let Some(days) = self.retention.keep_days {
            if !(1..=MAX_WINDOW_DAYS).contains(&days) {
                return Err(PulseError::Config(format!(
                    "retention.keep_days = {days} must be within [1, {MAX_WINDOW_DAYS}]"
                )));
            }
        }
        Ok(())
    }

    /// Look up a classification context by name.
    pub fn context(&self, name: &str) -> Result<&ContextConfig, PulseError> {
        self.contexts.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.contexts.keys().map(String::as_str).collect();
            PulseError::Config(format!("unknown context `{name}` (configured: {})", known.join(", ")))
        })
    }

    /// Apply environment overrides on top of the file values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = env::var(ENV_DATA_DIR) {
            self.paths.data_dir = PathBuf::from(dir);
        }
        self
    }

    /// Log the effective configuration at startup.
    pub fn log_summary(&self) {
        info!(
            data_dir = %self.paths.data_dir.display(),
            roster = %self.paths.roster.display(),
            contexts = ?self.contexts.keys().collect::<Vec<_>>(),
            blocked_domains = self.intake.blocked_domains.len(),
            neutralized_terms = self.sentiment.neutralize.len(),
            retention_days = ?self.retention.keep_days,
            "Configuration loaded"
        );
    }
}

/// Config file path from `MEDIAPULSE_CONFIG`, else `mediapulse.toml`.
pub fn config_path_from_env() -> PathBuf {
    env::var(ENV_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load, parse and validate a TOML config file. A missing file yields the
/// defaults.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        info!(path = %path.display(), "No config file found, using defaults");
        return Ok(FileConfig::default().with_env_overrides());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = FileConfig::from_toml(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config.with_env_overrides())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = FileConfig::from_toml("").unwrap();
        assert!(config.contexts.contains_key("serp"));
        assert!(config.contexts.contains_key("news"));
        assert_eq!(config.control.always_uncontrolled, vec!["wikipedia.org".to_string()]);
        assert_eq!(config.retention.keep_days, Some(365));
    }

    #[test]
    fn contexts_are_configured_independently() {
        let config = FileConfig::from_toml(
            r#"
            [contexts.headlines]
            positive_threshold = 0.05
            negative_threshold = -0.05

            [contexts.ceo_serp]
            positive_threshold = 0.25
            negative_threshold = -0.15
            force_positive_if_controlled = true
            text_source = "snippet"
            "#,
        )
        .unwrap();
        let serp = config.context("ceo_serp").unwrap();
        assert_eq!(serp.positive_threshold, 0.25);
        assert_eq!(serp.text_source, TextSource::Snippet);
        assert!(serp.force_positive_if_controlled);
        assert!(!config.context("headlines").unwrap().force_positive_if_controlled);
        assert!(config.context("serp").is_err());
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let err = FileConfig::from_toml(
            r#"
            [contexts.news]
            positive_threshold = -0.2
            negative_threshold = 0.2
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, PulseError::Config(_)));
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let err = FileConfig::from_toml(
            r#"
            [contexts.news]
            positive_threshold = 1.5
            "#,
        )
        .unwrap_err();
        assert!(err.is_fatal_config());
    }

    #[test]
    fn retention_window_must_be_positive_and_bounded() {
        for days in ["-1", "0", "200000000"] {
            let err = FileConfig::from_toml(&format!("[retention]\nkeep_days = {days}\n")).unwrap_err();
            assert!(err.is_fatal_config(), "keep_days = {days}");
        }
        let config = FileConfig::from_toml("[retention]\nkeep_days = 1\n").unwrap();
        assert_eq!(config.retention.keep_days, Some(1));
    }

    #[test]
    fn negative_cooldown_rejected() {
        let err = FileConfig::from_toml("[alerts]\ncooldown_days = -1\n").unwrap_err();
        assert!(matches!(err, PulseError::Config(_)));
        let config = FileConfig::from_toml("[alerts]\ncooldown_days = 0\n").unwrap();
        assert_eq!(config.alerts.cooldown_days, 0);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(FileConfig::from_toml("[paths]\nroaster = \"x\"").is_err());
    }

    #[test]
    fn load_config_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mediapulse.toml");
        std::fs::write(&path, "[alerts]\ncooldown_days = 30\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.alerts.cooldown_days, 30);
    }

    #[test]
    fn sample_config_parses() {
        let config = FileConfig::from_toml(include_str!("../../../mediapulse.toml")).unwrap();
        let brand = config.context("brand_serp").unwrap();
        assert!(brand.aggregate_edited);
        assert_eq!(brand.text_source, TextSource::TitleAndSnippet);
        assert_eq!(config.sentiment.lexicon.get("layoffs"), Some(&-2.0));
        assert_eq!(config.intake.max_per_alias, Some(100));
    }
}
