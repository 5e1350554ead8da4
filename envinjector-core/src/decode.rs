//! Decoding of shell-operator binding contexts.
//!
//! The hook's binding projects every watched object through a jq filter, so
//! each snapshot arrives as a `filterResult` holding only the fields used
//! here. `Synchronization` contexts carry a list of `objects`, `Event`
//! contexts carry a single `filterResult` next to the raw `object`.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::DecodeError;
use crate::model::{Container, Entity, EnvVar, Origin};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBindingContext {
    #[serde(rename = "type", default)]
    type_: Option<String>,
    #[serde(default)]
    objects: Option<Vec<RawObject>>,
    #[serde(default)]
    filter_result: Option<RawSnapshot>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawObject {
    #[serde(default)]
    filter_result: Option<RawSnapshot>,
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
    #[serde(default)]
    containers: Option<Vec<RawContainer>>,
}

#[derive(Debug, Deserialize)]
struct RawContainer {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    env: Option<Vec<EnvVar>>,
}

impl RawBindingContext {
    fn into_snapshots(self) -> Vec<Option<RawSnapshot>> {
        match self.objects {
            Some(objects) => objects.into_iter().map(|o| o.filter_result).collect(),
            None if self.type_.as_deref() == Some("Event") => vec![self.filter_result],
            None => Vec::new(),
        }
    }
}

/// Decode a binding context document into the entities it describes.
///
/// Entities come out in document order, containers in the order of their
/// pod spec. Any malformed or incomplete snapshot fails the whole document.
pub fn decode_binding_context(input: &[u8]) -> Result<Vec<Entity>, DecodeError> {
    let contexts: Vec<RawBindingContext> = serde_json::from_slice(input)?;
    let mut entities = Vec::new();
    for (event, context) in contexts.into_iter().enumerate() {
        for (object, snapshot) in context.into_snapshots().into_iter().enumerate() {
            entities.push(decode_snapshot(Origin { event, object }, snapshot)?);
        }
    }
    Ok(entities)
}

fn decode_snapshot(origin: Origin, snapshot: Option<RawSnapshot>) -> Result<Entity, DecodeError> {
    let missing = |field: &'static str| DecodeError::MissingField { origin, field };

    let snapshot = snapshot.ok_or_else(|| missing("filterResult"))?;
    let namespace = snapshot.namespace.ok_or_else(|| missing("namespace"))?;
    let name = snapshot.name.ok_or_else(|| missing("name"))?;
    let containers = snapshot
        .containers
        .ok_or_else(|| missing("containers"))?
        .into_iter()
        .enumerate()
        .map(|(index, c)| Container {
            index,
            name: c.name.unwrap_or_default(),
            env: c.env.unwrap_or_default(),
        })
        .collect();

    Ok(Entity {
        origin,
        namespace,
        name,
        labels: snapshot.labels.unwrap_or_default(),
        containers,
    })
}
