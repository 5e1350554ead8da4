use anyhow::{Context as _, Result};
use envinjector_core::interrupt::InterruptState;

fn set_process_interrupt_handler(interrupted: &InterruptState) -> Result<()> {
    let interrupted = interrupted.clone();
    ctrlc::set_handler(move || {
        tracing::warn!("termination requested, the patch document will not be written");
        interrupted.set_interrupted();
    })
    .context("setting interrupt handler")
}

pub fn set_up_process_interrupt_handler() -> Result<InterruptState> {
    let interrupt_state = InterruptState::new();
    set_process_interrupt_handler(&interrupt_state)?;
    Ok(interrupt_state)
}
