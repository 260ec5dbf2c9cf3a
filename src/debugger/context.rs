use super::breakpoints::Breakpoints;
use super::effects::{Effect, StatusMessage};
use super::stepping::{next_phase, Phase, PhaseEvent};
use crate::engine::Address;

/// The debugger's own state, independent of the engine.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    phase: Phase,
    interrupt_requested: bool,
    pub breakpoints: Breakpoints,
    current_address: Option<Address>,
    status: Option<StatusMessage>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    pub fn halted_at(&self) -> Option<Address> {
        self.phase.halted_at()
    }

    pub fn interrupt_requested(&self) -> bool {
        self.interrupt_requested
    }

    pub fn current_address(&self) -> Option<Address> {
        self.current_address
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Apply a phase event; emits a run-state effect only when the phase moved.
    pub fn transition(&mut self, event: PhaseEvent) -> Option<Effect> {
        let before = self.phase;
        self.phase = next_phase(before, event);
        match event {
            PhaseEvent::StartRun => self.interrupt_requested = false,
            PhaseEvent::ManualStep | PhaseEvent::Unloaded | PhaseEvent::Faulted => {
                self.interrupt_requested = true
            }
            _ => {}
        }
        if self.phase == before {
            return None;
        }
        Some(Effect::RunState {
            running: self.phase.is_running(),
            halted: self.phase.halted_at().is_some(),
        })
    }

    pub fn request_interrupt(&mut self) {
        self.interrupt_requested = true;
    }

    pub fn set_current_address(&mut self, addr: Option<Address>) {
        self.current_address = addr;
    }

    pub fn set_status(&mut self, message: StatusMessage) -> Effect {
        self.status = Some(message.clone());
        Effect::status(message)
    }

    pub fn clear_status(&mut self) -> Option<Effect> {
        self.status.take()?;
        Some(Effect::Status { message: None })
    }
}
