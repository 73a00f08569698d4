use std::fmt;

use mediapulse_common::config::ControlConfig;
use mediapulse_common::{alnum_only, host_within, simplify, EntityKey};

/// One predicate in the control chain. Each rule either decides the verdict
/// or passes to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRule {
    /// Host on the always-uncontrolled list. Beats domain ownership.
    UncontrolledHost,
    /// Host is, or is under, a domain the roster assigns to the entity.
    OwnedDomain,
    /// Entity name appears in the dot-stripped host.
    NameInHost,
    /// Social network or app store host.
    PlatformHost,
    /// Governance, about or leadership page.
    PathKeyword,
    /// First organic search position.
    TopPosition,
}

impl ControlRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlRule::UncontrolledHost => "uncontrolled_host",
            ControlRule::OwnedDomain => "owned_domain",
            ControlRule::NameInHost => "name_in_host",
            ControlRule::PlatformHost => "platform_host",
            ControlRule::PathKeyword => "path_keyword",
            ControlRule::TopPosition => "top_position",
        }
    }
}

impl fmt::Display for ControlRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the chain looks at for one result.
#[derive(Debug, Clone, Copy)]
pub struct ControlInput<'a> {
    /// Lowercased host without `www.`.
    pub host: &'a str,
    pub path: &'a str,
    pub position: Option<u32>,
    pub entity: Option<&'a EntityKey>,
    pub owned_domains: &'a [String],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlDecision {
    pub controlled: bool,
    /// Rule that decided; `None` means no rule fired.
    pub rule: Option<ControlRule>,
}

impl ControlDecision {
    const DEFAULT: ControlDecision = ControlDecision {
        controlled: false,
        rule: None,
    };
}

/// Ordered first-match-wins rule chain built from configuration.
#[derive(Debug, Clone)]
pub struct ControlChain {
    rules: Vec<ControlRule>,
    uncontrolled_hosts: Vec<String>,
    platform_hosts: Vec<String>,
    path_keywords: Vec<String>,
}

impl ControlChain {
    pub fn new(config: &ControlConfig) -> Self {
        let mut rules = vec![
            ControlRule::UncontrolledHost,
            ControlRule::OwnedDomain,
            ControlRule::NameInHost,
            ControlRule::PlatformHost,
            ControlRule::PathKeyword,
        ];
        if config.top_position_controlled {
            rules.push(ControlRule::TopPosition);
        }
        let lower = |v: &[String]| -> Vec<String> {
            v.iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        Self {
            rules,
            uncontrolled_hosts: lower(&config.always_uncontrolled),
            platform_hosts: lower(&config.always_controlled),
            path_keywords: lower(&config.path_keywords),
        }
    }

    pub fn rules(&self) -> &[ControlRule] {
        &self.rules
    }

    pub fn decide(&self, input: &ControlInput<'_>) -> ControlDecision {
        if input.host.is_empty() {
            return ControlDecision::DEFAULT;
        }
        for rule in &self.rules {
            if let Some(controlled) = self.evaluate(*rule, input) {
                return ControlDecision {
                    controlled,
                    rule: Some(*rule),
                };
            }
        }
        ControlDecision::DEFAULT
    }

    fn evaluate(&self, rule: ControlRule, input: &ControlInput<'_>) -> Option<bool> {
        let fired = match rule {
            ControlRule::UncontrolledHost => {
                return any_host(&self.uncontrolled_hosts, input.host).then_some(false)
            }
            ControlRule::OwnedDomain => any_host(input.owned_domains, input.host),
            ControlRule::NameInHost => input.entity.is_some_and(|e| {
                let name = host_token(e);
                !name.is_empty() && alnum_only(input.host).contains(&name)
            }),
            ControlRule::PlatformHost => any_host(&self.platform_hosts, input.host),
            ControlRule::PathKeyword => {
                let path = input.path.to_lowercase();
                let slashed = format!("{path}/");
                self.path_keywords
                    .iter()
                    .any(|k| path.contains(k.as_str()) || slashed.contains(k.as_str()))
            }
            ControlRule::TopPosition => input.position == Some(1),
        };
        fired.then_some(true)
    }
}

fn any_host(domains: &[String], host: &str) -> bool {
    domains.iter().any(|d| host_within(host, d))
}

/// Name compared against hosts: organization when tracked, otherwise the
/// person or brand.
fn host_token(entity: &EntityKey) -> String {
    let org = simplify(&entity.organization);
    if org.is_empty() {
        alnum_only(&simplify(&entity.person))
    } else {
        alnum_only(&org)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> EntityKey {
        EntityKey::new("Jane Doe", "Acme Corp")
    }

    fn input<'a>(host: &'a str, path: &'a str, entity: &'a EntityKey, owned: &'a [String]) -> ControlInput<'a> {
        ControlInput {
            host,
            path,
            position: None,
            entity: Some(entity),
            owned_domains: owned,
        }
    }

    #[test]
    fn uncontrolled_host_short_circuits_name_match() {
        let chain = ControlChain::new(&ControlConfig::default());
        let entity = EntityKey::new("Jane Doe", "Wikipedia");
        let owned = vec!["wikipedia.org".to_string()];
        let decision = chain.decide(&input("en.wikipedia.org", "/wiki/Jane_Doe", &entity, &owned));
        assert_eq!(
            decision,
            ControlDecision {
                controlled: false,
                rule: Some(ControlRule::UncontrolledHost)
            }
        );
    }

    #[test]
    fn owned_domain_covers_subdomains() {
        let chain = ControlChain::new(&ControlConfig::default());
        let entity = EntityKey::new("Jane Doe", "Globex");
        let owned = vec!["initech.com".to_string()];
        let decision = chain.decide(&input("ir.initech.com", "/", &entity, &owned));
        assert_eq!(decision.rule, Some(ControlRule::OwnedDomain));
        assert!(decision.controlled);
    }

    #[test]
    fn name_in_host_uses_suffix_stripped_org() {
        let chain = ControlChain::new(&ControlConfig::default());
        let entity = acme();
        let decision = chain.decide(&input("news.acme.com", "/x", &entity, &[]));
        assert_eq!(decision.rule, Some(ControlRule::NameInHost));
    }

    #[test]
    fn platform_hosts_match_on_label_boundary() {
        let chain = ControlChain::new(&ControlConfig::default());
        let entity = acme();
        assert_eq!(
            chain.decide(&input("x.com", "/janedoe", &entity, &[])).rule,
            Some(ControlRule::PlatformHost)
        );
        assert!(!chain.decide(&input("box.com", "/janedoe", &entity, &[])).controlled);
    }

    #[test]
    fn path_keyword_matches_without_trailing_slash() {
        let chain = ControlChain::new(&ControlConfig::default());
        let entity = acme();
        let decision = chain.decide(&input("example.org", "/company/Leadership", &entity, &[]));
        assert_eq!(decision.rule, Some(ControlRule::PathKeyword));
    }

    #[test]
    fn top_position_is_configurable() {
        let entity = acme();
        let mut i = input("example.org", "/story", &entity, &[]);
        i.position = Some(1);
        assert!(ControlChain::new(&ControlConfig::default()).decide(&i).controlled);

        let config = ControlConfig {
            top_position_controlled: false,
            ..ControlConfig::default()
        };
        let chain = ControlChain::new(&config);
        assert!(!chain.rules().contains(&ControlRule::TopPosition));
        assert_eq!(chain.decide(&i), ControlDecision::DEFAULT);
    }

    #[test]
    fn empty_host_is_uncontrolled() {
        let chain = ControlChain::new(&ControlConfig::default());
        let entity = acme();
        let mut i = input("", "/about/", &entity, &[]);
        i.position = Some(1);
        assert_eq!(chain.decide(&i), ControlDecision::DEFAULT);
    }

    #[test]
    fn unresolved_rows_skip_entity_rules() {
        let chain = ControlChain::new(&ControlConfig::default());
        let i = ControlInput {
            host: "acme.com",
            path: "/news",
            position: Some(4),
            entity: None,
            owned_domains: &[],
        };
        assert!(!chain.decide(&i).controlled);
    }
}
