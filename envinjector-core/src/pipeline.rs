use crate::boundary::{Sink, Source};
use crate::catalog::RequirementCatalog;
use crate::compile::{compile_container, PatchOperation};
use crate::decode::decode_binding_context;
use crate::encode::{encode_patch_document, PatchFormat};
use crate::error::Error;
use crate::interrupt::InterruptState;
use crate::model::TargetResource;
use crate::report::Reporter;

/// Per-run parameters of the hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub target: TargetResource,
    /// Also emit variables that a container already defines.
    pub overwrite: bool,
    pub format: PatchFormat,
}

/// Decode a binding context and compile the patches it calls for.
///
/// Entities are processed strictly in input order. The interrupt flag is
/// checked before each entity.
pub fn compile_patches(
    input: &[u8],
    catalog: &RequirementCatalog,
    settings: &Settings,
    interrupt: &InterruptState,
    reporter: &mut dyn Reporter,
) -> Result<Vec<PatchOperation>, Error> {
    let entities = decode_binding_context(input)?;
    reporter.decoded(&entities);

    let mut operations = Vec::new();
    for entity in &entities {
        interrupt.check_interrupted()?;
        for container in &entity.containers {
            let additions = catalog.resolve(&container.env, settings.overwrite);
            reporter.resolved(entity, container, &additions);
            if let Some(op) = compile_container(&settings.target, entity, container, additions) {
                reporter.compiled(&op);
                operations.push(op);
            }
        }
    }
    Ok(operations)
}

/// Run the hook once: read `source`, compile, and write the patch document
/// to `sink`.
///
/// The sink is only touched once the complete document exists and the run
/// has not been interrupted. Returns the number of emitted operations.
pub fn run(
    source: &Source,
    sink: &Sink,
    catalog: &RequirementCatalog,
    settings: &Settings,
    interrupt: &InterruptState,
    reporter: &mut dyn Reporter,
) -> Result<usize, Error> {
    let input = source.read()?;
    let operations = compile_patches(&input, catalog, settings, interrupt, reporter)?;
    let document = encode_patch_document(&operations, settings.format)?;
    interrupt.check_interrupted()?;
    sink.write_atomic(&document)?;
    Ok(operations.len())
}
