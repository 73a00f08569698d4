//! Cleanup applied to fetched rows before resolution: tracking parameters
//! stripped, wire-service hosts dropped, repeats collapsed.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use mediapulse_common::config::IntakeConfig;
use mediapulse_common::{host_of, host_within, normalize, RawResult};

const TRACKING_PARAMS: &[&str] = &[
    "fbclid",
    "gclid",
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "ref",
    "mc_cid",
    "mc_eid",
    "ocid",
    "guccounter",
];

/// Strip tracking parameters and fragments so the same article matches
/// across runs.
pub fn sanitize_url(url: &str) -> String {
    let url = url.trim();
    let Ok(mut parsed) = url::Url::parse(url) else {
        return url.to_string();
    };
    if parsed.query().is_none() && parsed.fragment().is_none() {
        return url.to_string();
    }
    parsed.set_fragment(None);
    if parsed.query().is_none() {
        return parsed.to_string();
    }

    let clean_pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if clean_pairs.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(clean_pairs);
    }
    parsed.to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntakeStats {
    pub received: usize,
    pub blocked: usize,
    pub duplicates: usize,
    pub over_cap: usize,
    pub kept: usize,
}

/// Clean a day's raw rows. Order of surviving rows is preserved.
pub fn prepare(rows: Vec<RawResult>, config: &IntakeConfig) -> (Vec<RawResult>, IntakeStats) {
    let blocked: Vec<String> = config
        .blocked_domains
        .iter()
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect();

    let mut stats = IntakeStats {
        received: rows.len(),
        ..IntakeStats::default()
    };
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut per_alias: HashMap<String, usize> = HashMap::new();
    let mut kept = Vec::with_capacity(rows.len());

    for mut row in rows {
        row.url = sanitize_url(&row.url);
        if row.domain.trim().is_empty() {
            row.domain = host_of(&row.url);
        }
        let host = {
            let h = host_of(&row.url);
            if h.is_empty() {
                row.domain.trim().to_lowercase()
            } else {
                h
            }
        };
        if blocked.iter().any(|d| host_within(&host, d)) {
            stats.blocked += 1;
            continue;
        }

        let alias = normalize(&row.query_alias);
        let key = (alias.clone(), normalize(&row.title), host);
        if !seen.insert(key) {
            stats.duplicates += 1;
            continue;
        }

        if let Some(cap) = config.max_per_alias {
            let n = per_alias.entry(alias).or_default();
            if *n >= cap {
                stats.over_cap += 1;
                continue;
            }
            *n += 1;
        }
        kept.push(row);
    }

    stats.kept = kept.len();
    debug!(
        received = stats.received,
        blocked = stats.blocked,
        duplicates = stats.duplicates,
        over_cap = stats.over_cap,
        kept = stats.kept,
        "Intake complete"
    );
    (kept, stats)
}
