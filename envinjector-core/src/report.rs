use crate::compile::PatchOperation;
use crate::model::{Container, Entity, EnvVar};

/// Observer of a pipeline run.
///
/// The pipeline itself does no logging; callers pass a reporter to see what
/// was decided.
pub trait Reporter {
    fn decoded(&mut self, _entities: &[Entity]) {}

    fn resolved(&mut self, _entity: &Entity, _container: &Container, _additions: &[EnvVar]) {}

    fn compiled(&mut self, _operation: &PatchOperation) {}
}

/// A reporter that ignores everything.
pub struct Silent;

impl Reporter for Silent {}
