//! Roster and alias tables, and the alias index built from them.
//!
//! The index is rebuilt from scratch on every run and never mutated after
//! construction. Explicit aliases win over the auto-generated
//! `"{person} {organization}"` alias of a roster entry.

use std::collections::HashMap;

use tracing::{debug, warn};

use mediapulse_common::{cell, normalize, website_host, EntityKey, PulseError, Table};

const PERSON_COLUMNS: &[&str] = &["person", "ceo", "name"];
const ORGANIZATION_COLUMNS: &[&str] = &["organization", "company", "brand", "org", "employer"];
const WEBSITE_COLUMNS: &[&str] = &["website", "domain", "url", "site", "homepage"];
const ALIAS_COLUMNS: &[&str] = &["alias"];

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub entity: EntityKey,
    /// Bare host of the entity's own site, if the roster lists one.
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasRecord {
    pub alias: String,
    pub entity: EntityKey,
    pub website: Option<String>,
}

/// Resolve the identity columns of a table. A table with an organization
/// column but no person column is a brand-only roster: the brand name
/// becomes the person and the organization stays empty.
fn identity_columns<'a>(table: &'a Table, name: &str) -> Result<(&'a str, Option<&'a str>), PulseError> {
    let person = table.find_column(PERSON_COLUMNS);
    let organization = table.find_column(ORGANIZATION_COLUMNS);
    match (person, organization) {
        (Some(p), org) => Ok((p, org)),
        (None, Some(org)) => Ok((org, None)),
        (None, None) => Err(PulseError::MissingColumn {
            table: name.to_string(),
            column: "person".to_string(),
        }),
    }
}

/// Parse roster rows. Rows without a person are skipped; duplicate entities
/// keep their first website.
pub fn roster_from_table(table: &Table) -> Result<Vec<RosterEntry>, PulseError> {
    let (person_col, org_col) = identity_columns(table, "roster")?;
    let website_col = table.find_column(WEBSITE_COLUMNS);

    let mut entries: Vec<RosterEntry> = Vec::new();
    for (i, row) in table.rows.iter().enumerate() {
        let person = cell(row, person_col);
        if person.is_empty() {
            warn!(row = i + 1, "Roster row has no person, skipping");
            continue;
        }
        let organization = org_col.map(|c| cell(row, c)).unwrap_or("");
        let entity = EntityKey::new(person, organization);
        let website = website_col.and_then(|c| website_host(cell(row, c)));

        match entries.iter_mut().find(|e| e.entity == entity) {
            Some(existing) => {
                if existing.website.is_none() {
                    existing.website = website;
                }
            }
            None => entries.push(RosterEntry { entity, website }),
        }
    }
    Ok(entries)
}

/// Parse explicit alias rows. The `alias` column is required.
pub fn aliases_from_table(table: &Table) -> Result<Vec<AliasRecord>, PulseError> {
    let alias_col = table.find_column(ALIAS_COLUMNS).ok_or_else(|| PulseError::MissingColumn {
        table: "aliases".to_string(),
        column: "alias".to_string(),
    })?;
    let (person_col, org_col) = identity_columns(table, "aliases")?;
    let website_col = table.find_column(WEBSITE_COLUMNS);

    let mut records = Vec::new();
    for row in &table.rows {
        let alias = cell(row, alias_col);
        let person = cell(row, person_col);
        if alias.is_empty() || person.is_empty() {
            continue;
        }
        records.push(AliasRecord {
            alias: alias.to_string(),
            entity: EntityKey::new(person, org_col.map(|c| cell(row, c)).unwrap_or("")),
            website: website_col.and_then(|c| website_host(cell(row, c))),
        });
    }
    Ok(records)
}

/// Normalized alias -> entity, plus the candidate list for fallback matching
/// and each entity's owned domains.
#[derive(Debug, Clone, Default)]
pub struct AliasIndex {
    by_alias: HashMap<String, EntityKey>,
    /// First-seen order: roster entries, then alias-only entities.
    entities: Vec<EntityKey>,
    roster: Vec<EntityKey>,
    owned_domains: HashMap<EntityKey, Vec<String>>,
}

impl AliasIndex {
    pub fn build(roster: &[RosterEntry], aliases: &[AliasRecord]) -> Result<Self, PulseError> {
        let mut index = AliasIndex::default();

        for entry in roster {
            index.add_entity(&entry.entity, entry.website.as_deref());
            index.roster.push(entry.entity.clone());
        }

        for record in aliases {
            let key = normalize(&record.alias);
            if key.is_empty() {
                continue;
            }
            if let Some(previous) = index.by_alias.get(&key) {
                if previous != &record.entity {
                    warn!(alias = key.as_str(), kept = %previous, ignored = %record.entity, "Alias maps to two entities, keeping the first");
                }
                continue;
            }
            index.by_alias.insert(key, record.entity.clone());
            index.add_entity(&record.entity, record.website.as_deref());
        }

        for entry in roster {
            let key = normalize(&entry.entity.default_alias());
            if !key.is_empty() {
                index.by_alias.entry(key).or_insert_with(|| entry.entity.clone());
            }
        }

        if index.by_alias.is_empty() {
            return Err(PulseError::EmptyAliasTable);
        }
        debug!(
            aliases = index.by_alias.len(),
            entities = index.entities.len(),
            "Alias index built"
        );
        Ok(index)
    }

    fn add_entity(&mut self, entity: &EntityKey, website: Option<&str>) {
        if !self.entities.contains(entity) {
            self.entities.push(entity.clone());
        }
        if let Some(host) = website {
            let domains = self.owned_domains.entry(entity.clone()).or_default();
            if !domains.iter().any(|d| d == host) {
                domains.push(host.to_string());
            }
        }
    }

    /// Exact lookup of an already-normalized alias.
    pub fn lookup(&self, normalized_alias: &str) -> Option<&EntityKey> {
        self.by_alias.get(normalized_alias)
    }

    /// Fallback candidates in first-seen order.
    pub fn entities(&self) -> &[EntityKey] {
        &self.entities
    }

    /// Roster entities; each gets an aggregate row every processed day.
    pub fn roster(&self) -> &[EntityKey] {
        &self.roster
    }

    pub fn owned_domains(&self, entity: &EntityKey) -> &[String] {
        self.owned_domains
            .get(entity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_alias.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_alias.is_empty()
    }
}
