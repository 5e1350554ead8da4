use std::{
    error::Error,
    fmt::Display,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// Shared cancellation flag for a hook run.
///
/// Clones observe the same flag, so one clone can be handed to a signal
/// handler while the pipeline polls another.
#[derive(Clone, Debug, Default)]
pub struct InterruptState {
    interrupted: Arc<AtomicBool>,
}

#[derive(Clone, Debug)]
pub struct InterruptedError {}
impl Display for InterruptedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "interrupted before the patch document was written")
    }
}
impl Error for InterruptedError {}

impl InterruptState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_interrupted(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub fn check_interrupted(&self) -> Result<(), InterruptedError> {
        if self.is_interrupted() {
            Err(InterruptedError {})
        } else {
            Ok(())
        }
    }
}
