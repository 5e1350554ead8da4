//! The configuration shell-operator reads from `envinjector --config`.

use anyhow::Result;
use envinjector_core::encode::jq_path;
use serde::Serialize;

use crate::options::Options;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HookConfig {
    config_version: &'static str,
    kubernetes: Vec<KubernetesBinding>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KubernetesBinding {
    api_version: String,
    kind: String,
    name: String,
    execute_hook_on_event: Vec<&'static str>,
    jq_filter: String,
}

fn hook_config(options: &Options) -> HookConfig {
    let containers = jq_path(&options.containers_path.0);
    HookConfig {
        config_version: "v1",
        kubernetes: vec![KubernetesBinding {
            api_version: options.api_version.clone(),
            kind: options.kind.clone(),
            name: options.binding_name.clone(),
            execute_hook_on_event: vec!["Added", "Modified"],
            jq_filter: format!(
                r#"{{"namespace": .metadata.namespace, "name": .metadata.name, "labels": .metadata.labels, "containers": [{}[] | {{name: .name, env: .env}}]}}"#,
                containers
            ),
        }],
    }
}

pub fn print(options: &Options) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&hook_config(options))?);
    Ok(())
}
