use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::Deserialize;

use crate::model::EnvVar;

/// One required variable and the value it gets when injected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequirementParseError {
    #[error("expected NAME=VALUE, got {0:?}")]
    MissingSeparator(String),
    #[error("variable name must not be empty in {0:?}")]
    EmptyName(String),
}

impl FromStr for Requirement {
    type Err = RequirementParseError;

    /// Parse `NAME=VALUE`. Only the first `=` separates; the value may be
    /// empty or contain further `=` characters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| RequirementParseError::MissingSeparator(s.to_string()))?;
        if name.is_empty() {
            return Err(RequirementParseError::EmptyName(s.to_string()));
        }
        Ok(Requirement {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

/// On-disk catalog formats: a plain object, or a list shaped like a
/// container's `env`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Object(BTreeMap<String, String>),
    List(Vec<CatalogEntry>),
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    name: String,
    #[serde(default)]
    value: String,
}

/// Parse a catalog file into requirements, in file order.
pub fn parse_catalog_document(input: &[u8]) -> Result<Vec<Requirement>, serde_json::Error> {
    let requirements = match serde_json::from_slice(input)? {
        CatalogDocument::Object(map) => map
            .into_iter()
            .map(|(name, value)| Requirement { name, value })
            .collect(),
        CatalogDocument::List(entries) => entries
            .into_iter()
            .map(|e| Requirement {
                name: e.name,
                value: e.value,
            })
            .collect(),
    };
    Ok(requirements)
}

/// The variables every container must carry.
///
/// Entries are kept sorted by name so that resolution never depends on the
/// order in which the catalog was assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementCatalog {
    entries: BTreeMap<String, String>,
}

impl RequirementCatalog {
    /// Build a catalog. When a name occurs more than once, the first
    /// occurrence wins.
    pub fn from_requirements(requirements: impl IntoIterator<Item = Requirement>) -> Self {
        let mut entries = BTreeMap::new();
        for r in requirements {
            entries.entry(r.name).or_insert(r.value);
        }
        RequirementCatalog { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Compute the variables to add to a container that currently has
    /// `existing` in its environment.
    ///
    /// Without `overwrite`, names already present are left alone. With it,
    /// every catalog entry is returned. The result is ordered by name.
    pub fn resolve(&self, existing: &[EnvVar], overwrite: bool) -> Vec<EnvVar> {
        let present: BTreeSet<&str> = existing.iter().map(|e| e.name.as_str()).collect();
        self.iter()
            .filter(|(name, _)| overwrite || !present.contains(name))
            .map(|(name, value)| EnvVar::new(name, value))
            .collect()
    }
}
