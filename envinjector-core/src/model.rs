use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A container environment variable.
///
/// Entries read from a snapshot may use `valueFrom` instead of `value`. Such
/// an entry still occupies its name, but its source is kept opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(
        rename = "valueFrom",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub value_from: Option<Value>,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        EnvVar {
            name: name.into(),
            value: value.into(),
            value_from: None,
        }
    }
}

/// A container as observed in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    /// Position in the owning entity's container list at decode time.
    /// Patches target this index.
    pub index: usize,
    pub name: String,
    pub env: Vec<EnvVar>,
}

/// Where in the binding context an entity was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Origin {
    pub event: usize,
    pub object: usize,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event {} object {}", self.event, self.object)
    }
}

/// An observed workload object, e.g. a Pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub origin: Origin,
    pub namespace: String,
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub containers: Vec<Container>,
}

/// The resource type the hook watches and patches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResource {
    pub api_version: String,
    pub kind: String,
    /// Field path of the container list within the resource, e.g.
    /// `spec.template.spec.containers` for workload controllers.
    pub containers_path: Vec<String>,
}

impl Default for TargetResource {
    fn default() -> Self {
        TargetResource {
            api_version: "v1".to_string(),
            kind: "Pod".to_string(),
            containers_path: vec!["spec".to_string(), "containers".to_string()],
        }
    }
}
