use std::path::Path;

use envinjector_core::boundary::{Sink, Source};
use envinjector_core::catalog::{Requirement, RequirementCatalog};
use envinjector_core::encode::PatchFormat;
use envinjector_core::interrupt::InterruptState;
use envinjector_core::pipeline::{run, Settings};
use envinjector_core::report::Silent;
use envinjector_core::Error;
use serde_json::{json, Value};

const CILIUM_ENVOY: &str = include_str!("../testdata/synchronization.json");

fn test_catalog() -> RequirementCatalog {
    RequirementCatalog::from_requirements(vec![Requirement {
        name: "TEST_ENVINJECTOR".to_string(),
        value: "TEST_ENVINJECTOR".to_string(),
    }])
}

/// Run the hook on `input` and return the raw patch document.
fn run_hook(dir: &Path, input: &str, settings: &Settings) -> Result<Vec<u8>, Error> {
    let binding_context = dir.join("binding-context.json");
    let patch = dir.join("patch.json");
    std::fs::write(&binding_context, input).unwrap();
    run(
        &Source::File(binding_context),
        &Sink::File(patch.clone()),
        &test_catalog(),
        settings,
        &InterruptState::new(),
        &mut Silent,
    )?;
    Ok(std::fs::read(patch).unwrap())
}

fn with_test_env_present(input: &str) -> String {
    let mut doc: Value = serde_json::from_str(input).unwrap();
    doc[0]["objects"][0]["filterResult"]["containers"][0]["env"]
        .as_array_mut()
        .unwrap()
        .push(json!({"name": "TEST_ENVINJECTOR", "value": "already-set"}));
    doc.to_string()
}

#[test]
fn missing_variable_is_appended() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_hook(dir.path(), CILIUM_ENVOY, &Settings::default()).unwrap();
    let doc: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(
        doc,
        json!([{
            "operation": "JQPatch",
            "apiVersion": "v1",
            "kind": "Pod",
            "namespace": "kube-system",
            "name": "cilium-envoy-9gx5c",
            "jqFilter": r#".spec.containers[0].env = .spec.containers[0].env + [{"name":"TEST_ENVINJECTOR","value":"TEST_ENVINJECTOR"}]"#,
        }])
    );
}

#[test]
fn present_variable_yields_empty_document() {
    let dir = tempfile::tempdir().unwrap();
    let input = with_test_env_present(CILIUM_ENVOY);
    let out = run_hook(dir.path(), &input, &Settings::default()).unwrap();
    assert_eq!(out, b"[]");
}

#[test]
fn overwrite_replaces_present_variable() {
    let dir = tempfile::tempdir().unwrap();
    let input = with_test_env_present(CILIUM_ENVOY);
    let settings = Settings {
        overwrite: true,
        ..Settings::default()
    };
    let doc: Value =
        serde_json::from_slice(&run_hook(dir.path(), &input, &settings).unwrap()).unwrap();
    assert_eq!(doc.as_array().unwrap().len(), 1);
    assert_eq!(
        doc[0]["jqFilter"],
        r#".spec.containers[0].env |= map(if .name == "TEST_ENVINJECTOR" then {"name":"TEST_ENVINJECTOR","value":"TEST_ENVINJECTOR"} else . end)"#
    );
}

#[test]
fn overwrite_json_patch_applies_without_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let input = with_test_env_present(CILIUM_ENVOY);
    let settings = Settings {
        overwrite: true,
        format: PatchFormat::JsonPatch,
        ..Settings::default()
    };
    let doc: Value =
        serde_json::from_slice(&run_hook(dir.path(), &input, &settings).unwrap()).unwrap();
    assert_eq!(doc[0]["operation"], "JSONPatch");
    let patch: json_patch::Patch = serde_json::from_value(doc[0]["jsonPatch"].clone()).unwrap();

    // Rebuild the live pod the snapshot was taken from and apply the patch
    let snapshot: Value = serde_json::from_str(&input).unwrap();
    let mut pod = json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {"namespace": "kube-system", "name": "cilium-envoy-9gx5c"},
        "spec": {
            "containers": snapshot[0]["objects"][0]["filterResult"]["containers"].clone()
        }
    });
    json_patch::patch(&mut pod, &patch.0).unwrap();

    let env = pod["spec"]["containers"][0]["env"].as_array().unwrap();
    let names: Vec<_> = env.iter().map(|e| e["name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        vec!["K8S_NODE_NAME", "CILIUM_K8S_NAMESPACE", "TEST_ENVINJECTOR"]
    );
    assert_eq!(env[2]["value"], "TEST_ENVINJECTOR");
}

#[test]
fn output_is_deterministic() {
    let input = include_str!("../testdata/multi-event.json");
    let first = run_hook(tempfile::tempdir().unwrap().path(), input, &Settings::default()).unwrap();
    let second =
        run_hook(tempfile::tempdir().unwrap().path(), input, &Settings::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn decode_failure_leaves_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let patch = dir.path().join("patch.json");
    std::fs::write(&patch, b"previous").unwrap();

    // Second object lacks its namespace
    let input = r#"[{"objects": [
        {"filterResult": {"namespace": "a", "name": "ok", "containers": [{"name": "c"}]}},
        {"filterResult": {"name": "broken", "containers": []}}
    ]}]"#;
    let err = run_hook(dir.path(), input, &Settings::default()).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
    assert_eq!(std::fs::read(&patch).unwrap(), b"previous");
}

#[test]
fn decode_failure_creates_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_hook(dir.path(), "[{", &Settings::default()).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
    assert!(!dir.path().join("patch.json").exists());
}
