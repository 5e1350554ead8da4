use anyhow::{Context as _, Result};
use chrono::Utc;
use envinjector_core::boundary::{Sink, Source};
use envinjector_core::catalog::{parse_catalog_document, RequirementCatalog};
use envinjector_core::compile::PatchOperation;
use envinjector_core::interrupt::InterruptState;
use envinjector_core::model::{Container, Entity, EnvVar};
use envinjector_core::pipeline::{self, Settings};
use envinjector_core::report::Reporter;
use tracing::{debug, info, info_span, warn};

use crate::options::Options;

/// Handle one binding context delivered by shell-operator.
pub fn run(options: &Options, interrupt_state: &InterruptState) -> Result<()> {
    let source = options
        .binding_context_path
        .as_deref()
        .map(Source::from_path)
        .context("no binding context; set BINDING_CONTEXT_PATH or --binding-context-path")?;
    let sink = options
        .k8s_patch_path
        .as_deref()
        .map(Sink::from_path)
        .context("no patch path; set KUBERNETES_PATCH_PATH or --k8s-patch-path")?;

    let event_id = event_id();
    let span = info_span!(
        "hook",
        event_id = %event_id,
        binding_context = %source,
        patch = %sink
    );
    let _enter = span.enter();
    info!("received event");

    let catalog = load_catalog(options)?;
    if catalog.is_empty() {
        warn!("no required variables configured, every patch will be empty");
    } else {
        debug!(variables = catalog.len(), "loaded catalog");
    }

    let settings = Settings {
        target: options.target(),
        overwrite: options.overwrite,
        format: options.patch_format.into(),
    };
    let written = pipeline::run(
        &source,
        &sink,
        &catalog,
        &settings,
        interrupt_state,
        &mut TracingReporter,
    )?;
    info!(operations = written, "patch document written");
    Ok(())
}

fn event_id() -> String {
    format!(
        "{}-{}",
        Utc::now().format("%Y%m%dT%H%M%S%.3fZ"),
        std::process::id()
    )
}

/// Command line variables first, then the catalog file. The first
/// occurrence of a name wins.
fn load_catalog(options: &Options) -> Result<RequirementCatalog> {
    let mut requirements = options.env.clone();
    if let Some(path) = &options.catalog {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        let from_file = parse_catalog_document(&bytes)
            .with_context(|| format!("parsing catalog {}", path.display()))?;
        requirements.extend(from_file);
    }
    Ok(RequirementCatalog::from_requirements(requirements))
}

struct TracingReporter;

impl Reporter for TracingReporter {
    fn decoded(&mut self, entities: &[Entity]) {
        info!(pods_count = entities.len(), "event parse success");
    }

    fn resolved(&mut self, entity: &Entity, container: &Container, additions: &[EnvVar]) {
        debug!(
            origin = %entity.origin,
            namespace = %entity.namespace,
            name = %entity.name,
            container = %container.name,
            additions = additions.len(),
            "processing container"
        );
    }

    fn compiled(&mut self, operation: &PatchOperation) {
        info!(
            namespace = %operation.namespace,
            name = %operation.name,
            container = %operation.edit.container_name,
            appended = operation.edit.appends().count(),
            replaced = operation.edit.replacements().count(),
            "compiled patch"
        );
    }
}
