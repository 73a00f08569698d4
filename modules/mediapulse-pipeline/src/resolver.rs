use mediapulse_common::{normalize, simplify, token_set, EntityKey};

use crate::roster::AliasIndex;

/// Outcome of resolving one query alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Normalized alias found verbatim in the index.
    Exact(EntityKey),
    /// Every token of the candidate's name appears in the alias.
    TokenSubset { entity: EntityKey, score: usize },
    Unresolved,
}

impl Resolution {
    pub fn entity(&self) -> Option<&EntityKey> {
        match self {
            Resolution::Exact(e) | Resolution::TokenSubset { entity: e, .. } => Some(e),
            Resolution::Unresolved => None,
        }
    }

    pub fn into_entity(self) -> Option<EntityKey> {
        match self {
            Resolution::Exact(e) | Resolution::TokenSubset { entity: e, .. } => Some(e),
            Resolution::Unresolved => None,
        }
    }
}

/// Fallback target for an entity: normalized person plus suffix-stripped
/// organization.
fn match_target(entity: &EntityKey) -> String {
    format!("{} {}", normalize(&entity.person), simplify(&entity.organization))
        .trim()
        .to_string()
}

/// Map a raw query alias to an entity.
///
/// Exact lookup first. Otherwise each candidate whose target tokens are a
/// subset of the alias tokens scores its token count; the highest score wins
/// and equal scores keep the earliest candidate.
pub fn resolve(query_alias: &str, index: &AliasIndex) -> Resolution {
    let query = normalize(query_alias);
    if query.is_empty() {
        return Resolution::Unresolved;
    }
    if let Some(entity) = index.lookup(&query) {
        return Resolution::Exact(entity.clone());
    }

    let query_tokens = token_set(&query);
    let mut best: Option<(&EntityKey, usize)> = None;
    for entity in index.entities() {
        let target = match_target(entity);
        let target_tokens = token_set(&target);
        if target_tokens.is_empty() || !target_tokens.is_subset(&query_tokens) {
            continue;
        }
        let score = target_tokens.len();
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((entity, score));
        }
    }

    match best {
        Some((entity, score)) => Resolution::TokenSubset {
            entity: entity.clone(),
            score,
        },
        None => Resolution::Unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{AliasRecord, RosterEntry};

    fn index(entities: &[(&str, &str)]) -> AliasIndex {
        let roster: Vec<RosterEntry> = entities
            .iter()
            .map(|(p, o)| RosterEntry {
                entity: EntityKey::new(*p, *o),
                website: None,
            })
            .collect();
        AliasIndex::build(&roster, &[]).unwrap()
    }

    #[test]
    fn exact_alias_hit() {
        let idx = index(&[("Jane Doe", "Acme Corp")]);
        assert_eq!(
            resolve("Jane Doe, Acme Corp", &idx),
            Resolution::Exact(EntityKey::new("Jane Doe", "Acme Corp"))
        );
    }

    #[test]
    fn explicit_alias_resolves_nickname() {
        let roster = vec![RosterEntry {
            entity: EntityKey::new("Jane Doe", "Acme Corp"),
            website: None,
        }];
        let aliases = vec![AliasRecord {
            alias: "JD Acme".into(),
            entity: EntityKey::new("Jane Doe", "Acme Corp"),
            website: None,
        }];
        let idx = AliasIndex::build(&roster, &aliases).unwrap();
        assert!(matches!(resolve("jd acme", &idx), Resolution::Exact(_)));
    }

    #[test]
    fn token_subset_ignores_legal_suffix_and_extra_words() {
        let idx = index(&[("Jane Doe", "Acme Corp")]);
        let got = resolve("CEO Jane Doe of Acme", &idx);
        assert_eq!(
            got,
            Resolution::TokenSubset {
                entity: EntityKey::new("Jane Doe", "Acme Corp"),
                score: 3
            }
        );
    }

    #[test]
    fn highest_score_wins() {
        let idx = index(&[("Smith", ""), ("John Smith", "Globex")]);
        let got = resolve("john smith globex news", &idx);
        assert_eq!(got.entity(), Some(&EntityKey::new("John Smith", "Globex")));
    }

    #[test]
    fn ties_go_to_first_seen_and_are_stable() {
        let idx = index(&[("Smith", "Initech"), ("Initech", "Smith")]);
        let first = resolve("smith initech today", &idx);
        assert_eq!(first.entity(), Some(&EntityKey::new("Smith", "Initech")));
        assert_eq!(resolve("smith initech today", &idx), first);

        let partial = index(&[("Ann Smith", "Initech"), ("Bob Smith", "Initech")]);
        assert_eq!(resolve("smith initech", &partial), Resolution::Unresolved);
    }

    #[test]
    fn blank_alias_is_unresolved() {
        let idx = index(&[("Jane Doe", "Acme Corp")]);
        assert_eq!(resolve("   ", &idx), Resolution::Unresolved);
        assert_eq!(resolve("?!", &idx), Resolution::Unresolved);
    }

    #[test]
    fn unknown_alias_is_unresolved() {
        let idx = index(&[("Jane Doe", "Acme Corp")]);
        assert_eq!(resolve("John Roe Globex", &idx).into_entity(), None);
    }
}
