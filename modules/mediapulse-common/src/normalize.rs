//! String canonicalization shared by resolution, control classification and
//! theme extraction. Every equality comparison between names goes through
//! [`normalize`] or [`simplify`].

use std::collections::HashSet;

/// Legal-entity tokens dropped by [`simplify`].
pub const LEGAL_SUFFIXES: &[&str] = &["inc", "corp", "llc", "ltd", "plc", "co", "ag", "sa", "nv"];

/// Lowercase, map anything outside `[a-z0-9\s]` to a space, collapse
/// whitespace and trim. Total: any input yields a (possibly empty) string.
pub fn normalize(s: &str) -> String {
    let mapped: String = s
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                ' '
            }
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`normalize`] plus removal of legal-entity suffix tokens, so that
/// "Acme Corp." and "ACME" compare equal.
pub fn simplify(s: &str) -> String {
    normalize(s)
        .split(' ')
        .filter(|t| !t.is_empty() && !LEGAL_SUFFIXES.contains(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whitespace tokens of an already-normalized string.
pub fn token_set(normalized: &str) -> HashSet<&str> {
    normalized.split_whitespace().collect()
}

/// Keep only ASCII alphanumerics, lowercased. Used to compare a name
/// against a host with its dots removed.
pub fn alnum_only(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Lowercased host of `url` with a leading `www.` removed. Empty when the URL
/// does not parse or carries no host.
pub fn host_of(url: &str) -> String {
    let Ok(parsed) = url::Url::parse(url.trim()) else {
        return String::new();
    };
    let host = parsed.host_str().unwrap_or("").to_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

/// Normalize a roster website cell ("acme.com", "https://www.acme.com/about")
/// into a bare host. Returns `None` when nothing host-like remains.
pub fn website_host(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return None;
    }
    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    let host = host_of(&with_scheme);
    (!host.is_empty() && host.contains('.')).then_some(host)
}

/// `host` equals `domain` or is one of its subdomains.
pub fn host_within(host: &str, domain: &str) -> bool {
    if host.is_empty() || domain.is_empty() {
        return false;
    }
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
