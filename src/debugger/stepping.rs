use crate::engine::Address;
use serde::Serialize;

/// Cycles executed per run burst before yielding to the host loop.
pub const DEFAULT_BURST_SIZE: usize = 10;

/// Where the stepping controller is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    /// Stopped before the instruction at this breakpoint address.
    HaltedAtBreakpoint(Address),
}

impl Phase {
    pub fn is_running(self) -> bool {
        matches!(self, Phase::Running)
    }

    pub fn halted_at(self) -> Option<Address> {
        match self {
            Phase::HaltedAtBreakpoint(addr) => Some(addr),
            _ => None,
        }
    }
}

/// Inputs to the phase machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// A manual forward or backward step, or a resume request.
    ManualStep,
    StartRun,
    BreakpointHit(Address),
    /// The interrupt flag was seen at a burst boundary.
    Interrupted,
    /// The engine handle was replaced or dropped.
    Unloaded,
    /// An engine call failed.
    Faulted,
}

pub fn next_phase(phase: Phase, event: PhaseEvent) -> Phase {
    match (phase, event) {
        (_, PhaseEvent::BreakpointHit(addr)) => Phase::HaltedAtBreakpoint(addr),
        (_, PhaseEvent::ManualStep) => Phase::Idle,
        (_, PhaseEvent::StartRun) => Phase::Running,
        (Phase::Running, PhaseEvent::Interrupted) => Phase::Idle,
        (other, PhaseEvent::Interrupted) => other,
        (_, PhaseEvent::Unloaded | PhaseEvent::Faulted) => Phase::Idle,
    }
}

/// Why execution stopped, as reported to front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    Step,
    StepBack,
    Breakpoint,
    Pause,
    Entry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halt_is_never_running() {
        let halted = next_phase(Phase::Running, PhaseEvent::BreakpointHit(6));
        assert_eq!(halted, Phase::HaltedAtBreakpoint(6));
        assert!(!halted.is_running());
        assert_eq!(halted.halted_at(), Some(6));
    }

    #[test]
    fn interrupt_only_stops_a_run() {
        assert_eq!(next_phase(Phase::Running, PhaseEvent::Interrupted), Phase::Idle);
        assert_eq!(
            next_phase(Phase::HaltedAtBreakpoint(4), PhaseEvent::Interrupted),
            Phase::HaltedAtBreakpoint(4)
        );
        assert_eq!(next_phase(Phase::Idle, PhaseEvent::Interrupted), Phase::Idle);
    }

    #[test]
    fn manual_step_clears_halt() {
        assert_eq!(
            next_phase(Phase::HaltedAtBreakpoint(4), PhaseEvent::ManualStep),
            Phase::Idle
        );
        assert_eq!(next_phase(Phase::Running, PhaseEvent::ManualStep), Phase::Idle);
    }
}
