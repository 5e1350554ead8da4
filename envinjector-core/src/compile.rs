use crate::model::{Container, Entity, EnvVar, TargetResource};

/// A single change to one container's `env` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvChange {
    /// Replace the entry observed at `position` in the container's env.
    Replace { position: usize, var: EnvVar },
    /// Append a new entry at the end of the env list.
    Append(EnvVar),
}

/// A targeted edit of the `env` list of one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEdit {
    /// Field path of the container list, see [`TargetResource`].
    pub containers_path: Vec<String>,
    pub container_index: usize,
    pub container_name: String,
    /// The observed container had no env entries at all.
    pub env_was_empty: bool,
    /// Replacements in env order, then appends in resolution order.
    pub changes: Vec<EnvChange>,
}

impl EnvEdit {
    pub fn appends(&self) -> impl Iterator<Item = &EnvVar> {
        self.changes.iter().filter_map(|c| match c {
            EnvChange::Append(var) => Some(var),
            EnvChange::Replace { .. } => None,
        })
    }

    pub fn replacements(&self) -> impl Iterator<Item = (usize, &EnvVar)> {
        self.changes.iter().filter_map(|c| match c {
            EnvChange::Replace { position, var } => Some((*position, var)),
            EnvChange::Append(_) => None,
        })
    }
}

/// A declarative instruction to mutate one live object.
///
/// This is the structured form; the encoder renders it into whichever patch
/// language the orchestrator is asked to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOperation {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub edit: EnvEdit,
}

/// Compile the additions resolved for one container of `entity` into a
/// patch, or `None` when there is nothing to add.
///
/// An addition whose name already occurs in the container replaces every
/// such entry in place. Other additions are appended.
pub fn compile_container(
    target: &TargetResource,
    entity: &Entity,
    container: &Container,
    additions: Vec<EnvVar>,
) -> Option<PatchOperation> {
    if additions.is_empty() {
        return None;
    }

    let mut replacements = Vec::new();
    let mut appends = Vec::new();
    for var in additions {
        let positions: Vec<usize> = container
            .env
            .iter()
            .enumerate()
            .filter(|(_, existing)| existing.name == var.name)
            .map(|(position, _)| position)
            .collect();
        if positions.is_empty() {
            appends.push(EnvChange::Append(var));
        } else {
            for position in positions {
                replacements.push(EnvChange::Replace {
                    position,
                    var: var.clone(),
                });
            }
        }
    }
    replacements.sort_by_key(|c| match c {
        EnvChange::Replace { position, .. } => *position,
        EnvChange::Append(_) => usize::MAX,
    });

    let mut changes = replacements;
    changes.extend(appends);

    Some(PatchOperation {
        api_version: target.api_version.clone(),
        kind: target.kind.clone(),
        namespace: entity.namespace.clone(),
        name: entity.name.clone(),
        edit: EnvEdit {
            containers_path: target.containers_path.clone(),
            container_index: container.index,
            container_name: container.name.clone(),
            env_was_empty: container.env.is_empty(),
            changes,
        },
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::Origin;

    fn entity(containers: Vec<Container>) -> Entity {
        Entity {
            origin: Origin {
                event: 0,
                object: 0,
            },
            namespace: "kube-system".to_string(),
            name: "cilium-envoy-9gx5c".to_string(),
            labels: BTreeMap::new(),
            containers,
        }
    }

    fn container(index: usize, env: &[&str]) -> Container {
        Container {
            index,
            name: format!("c{}", index),
            env: env.iter().map(|n| EnvVar::new(*n, "old")).collect(),
        }
    }

    #[test]
    fn no_additions_no_patch() {
        let c = container(0, &["A"]);
        let e = entity(vec![c.clone()]);
        assert_eq!(
            compile_container(&TargetResource::default(), &e, &c, vec![]),
            None
        );
    }

    #[test]
    fn appends_use_recorded_index() {
        let c = container(3, &["K8S_NODE_NAME"]);
        let e = entity(vec![c.clone()]);
        let op = compile_container(
            &TargetResource::default(),
            &e,
            &c,
            vec![EnvVar::new("TEST_ENVINJECTOR", "TEST_ENVINJECTOR")],
        )
        .unwrap();
        assert_eq!(op.api_version, "v1");
        assert_eq!(op.kind, "Pod");
        assert_eq!(op.namespace, "kube-system");
        assert_eq!(op.name, "cilium-envoy-9gx5c");
        assert_eq!(op.edit.container_index, 3);
        assert_eq!(op.edit.container_name, "c3");
        assert!(!op.edit.env_was_empty);
        assert_eq!(
            op.edit.changes,
            vec![EnvChange::Append(EnvVar::new(
                "TEST_ENVINJECTOR",
                "TEST_ENVINJECTOR"
            ))]
        );
    }

    #[test]
    fn identity_comes_from_target() {
        let c = container(0, &[]);
        let e = entity(vec![c.clone()]);
        let target = TargetResource {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            containers_path: vec![
                "spec".to_string(),
                "template".to_string(),
                "spec".to_string(),
                "containers".to_string(),
            ],
        };
        let op = compile_container(&target, &e, &c, vec![EnvVar::new("A", "1")]).unwrap();
        assert_eq!(op.api_version, "apps/v1");
        assert_eq!(op.kind, "Deployment");
        assert_eq!(op.edit.containers_path, target.containers_path);
        assert!(op.edit.env_was_empty);
    }

    #[test]
    fn present_names_are_replaced_in_place() {
        let c = container(0, &["B", "X", "B", "A"]);
        let e = entity(vec![c.clone()]);
        let op = compile_container(
            &TargetResource::default(),
            &e,
            &c,
            vec![
                EnvVar::new("A", "1"),
                EnvVar::new("B", "2"),
                EnvVar::new("C", "3"),
            ],
        )
        .unwrap();
        assert_eq!(
            op.edit.changes,
            vec![
                EnvChange::Replace {
                    position: 0,
                    var: EnvVar::new("B", "2")
                },
                EnvChange::Replace {
                    position: 2,
                    var: EnvVar::new("B", "2")
                },
                EnvChange::Replace {
                    position: 3,
                    var: EnvVar::new("A", "1")
                },
                EnvChange::Append(EnvVar::new("C", "3")),
            ]
        );
        assert_eq!(op.edit.appends().count(), 1);
        assert_eq!(
            op.edit.replacements().map(|(p, _)| p).collect::<Vec<_>>(),
            vec![0, 2, 3]
        );
    }
}
