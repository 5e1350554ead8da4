//! Rendering of compiled patches into shell-operator's patch document.
//!
//! See <https://flant.github.io/shell-operator/KUBERNETES.html> for the
//! operation objects the orchestrator accepts.

use std::collections::BTreeMap;

use json_patch::jsonptr::PointerBuf;
use json_patch::{AddOperation, Patch, ReplaceOperation, TestOperation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::compile::{EnvEdit, PatchOperation};
use crate::error::Error;
use crate::model::EnvVar;

/// The patch language used for emitted operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PatchFormat {
    /// `JQPatch` operations carrying a jq filter.
    #[default]
    Jq,
    /// `JSONPatch` operations carrying RFC 6902 operations.
    JsonPatch,
}

/// One entry of the patch document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation")]
pub enum Operation {
    #[serde(rename = "JQPatch")]
    JqPatch(JqPatch),
    #[serde(rename = "JSONPatch")]
    JsonPatch(JsonPatch),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JqPatch {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jq_filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonPatch {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub json_patch: Patch,
}

/// Render a field path as a jq path expression.
///
/// Segments that are not plain identifiers use the `["..."]` form, which
/// every jq dialect accepts.
pub fn jq_path(segments: &[String]) -> String {
    if segments.is_empty() {
        return ".".to_string();
    }
    let mut path = String::new();
    for segment in segments {
        let mut chars = segment.chars();
        let plain = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if plain {
            path.push('.');
            path.push_str(segment);
        } else {
            if path.is_empty() {
                path.push('.');
            }
            path.push_str(&format!("[{}]", Value::String(segment.clone())));
        }
    }
    path
}

/// Render `edit` as a jq filter.
///
/// Appends become `.spec.containers[i].env = .spec.containers[i].env + [...]`,
/// replacements a `map` over the env list matching on `.name`. All literals
/// are JSON produced by serde_json, which jq parses as-is.
pub fn render_jq_filter(edit: &EnvEdit) -> Result<String, serde_json::Error> {
    let env = format!(
        "{}[{}].env",
        jq_path(&edit.containers_path),
        edit.container_index
    );
    let mut steps = Vec::new();

    let replaced: BTreeMap<&str, &EnvVar> = edit
        .replacements()
        .map(|(_, var)| (var.name.as_str(), var))
        .collect();
    if !replaced.is_empty() {
        let mut branches = String::new();
        for (i, (name, var)) in replaced.into_iter().enumerate() {
            branches.push_str(if i == 0 { "if" } else { " elif" });
            branches.push_str(&format!(
                " .name == {} then {}",
                serde_json::to_string(name)?,
                serde_json::to_string(var)?
            ));
        }
        steps.push(format!("{} |= map({} else . end)", env, branches));
    }

    let appends: Vec<&EnvVar> = edit.appends().collect();
    if !appends.is_empty() {
        steps.push(format!(
            "{} = {} + {}",
            env,
            env,
            serde_json::to_string(&appends)?
        ));
    }

    Ok(steps.join(" | "))
}

fn env_pointer(edit: &EnvEdit, tail: &[String]) -> PointerBuf {
    let mut tokens = edit.containers_path.clone();
    tokens.push(edit.container_index.to_string());
    tokens.push("env".to_string());
    tokens.extend_from_slice(tail);
    PointerBuf::from_tokens(tokens)
}

/// Render `edit` as a JSON Patch.
///
/// Each replacement is guarded by a `test` of the name observed at that
/// position, so the patch fails rather than overwriting an entry that moved.
pub fn render_json_patch(edit: &EnvEdit) -> Result<Patch, serde_json::Error> {
    let mut ops = Vec::new();

    for (position, var) in edit.replacements() {
        ops.push(json_patch::PatchOperation::Test(TestOperation {
            path: env_pointer(edit, &[position.to_string(), "name".to_string()]),
            value: Value::String(var.name.clone()),
        }));
        ops.push(json_patch::PatchOperation::Replace(ReplaceOperation {
            path: env_pointer(edit, &[position.to_string()]),
            value: serde_json::to_value(var)?,
        }));
    }

    let appends: Vec<&EnvVar> = edit.appends().collect();
    if edit.env_was_empty && !appends.is_empty() {
        ops.push(json_patch::PatchOperation::Add(AddOperation {
            path: env_pointer(edit, &[]),
            value: serde_json::to_value(&appends)?,
        }));
    } else {
        for var in appends {
            ops.push(json_patch::PatchOperation::Add(AddOperation {
                path: env_pointer(edit, &["-".to_string()]),
                value: serde_json::to_value(var)?,
            }));
        }
    }

    Ok(Patch(ops))
}

pub fn render_operation(
    op: &PatchOperation,
    format: PatchFormat,
) -> Result<Operation, serde_json::Error> {
    Ok(match format {
        PatchFormat::Jq => Operation::JqPatch(JqPatch {
            api_version: op.api_version.clone(),
            kind: op.kind.clone(),
            namespace: op.namespace.clone(),
            name: op.name.clone(),
            jq_filter: render_jq_filter(&op.edit)?,
        }),
        PatchFormat::JsonPatch => Operation::JsonPatch(JsonPatch {
            api_version: op.api_version.clone(),
            kind: op.kind.clone(),
            namespace: op.namespace.clone(),
            name: op.name.clone(),
            json_patch: render_json_patch(&op.edit)?,
        }),
    })
}

/// Serialize the whole patch document, in operation order.
pub fn encode_patch_document(
    operations: &[PatchOperation],
    format: PatchFormat,
) -> Result<Vec<u8>, Error> {
    let rendered = operations
        .iter()
        .map(|op| render_operation(op, format))
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::Encode)?;
    serde_json::to_vec(&rendered).map_err(Error::Encode)
}
