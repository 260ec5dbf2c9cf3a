use super::inspector::{Cell, Snapshot};
use super::stepping::StopReason;
use crate::engine::{Address, Word};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// Message shown until cleared or replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }
}

/// One row of the disassembly trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceLine {
    pub address: Address,
    pub text: String,
    pub breakpoint: bool,
}

/// A view update produced by a controller operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "body", rename_all = "camelCase")]
pub enum Effect {
    /// `None` clears the message.
    Status { message: Option<StatusMessage> },
    Trace { lines: Vec<TraceLine> },
    /// Current instruction; `None` when there is nothing to show.
    #[serde(rename_all = "camelCase")]
    Highlight {
        address: Option<Address>,
        breakpoint_hit: bool,
    },
    Registers { cells: Vec<Cell<Word>> },
    Memory { start: u32, cells: Vec<Cell<u8>> },
    ClockCount { cycles: u64 },
    Breakpoints { addresses: Vec<Address> },
    RunState { running: bool, halted: bool },
    Stopped {
        reason: StopReason,
        address: Option<Address>,
    },
    Continued,
    /// Ask the host loop to call `run_burst` later.
    ScheduleBurst,
}

impl Effect {
    pub fn status(message: StatusMessage) -> Self {
        Effect::Status {
            message: Some(message),
        }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> [Effect; 2] {
        [
            Effect::Registers {
                cells: snapshot.registers,
            },
            Effect::Memory {
                start: snapshot.memory_start,
                cells: snapshot.memory,
            },
        ]
    }

    /// Name of the event this effect is sent as.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Status { .. } => "status",
            Effect::Trace { .. } => "trace",
            Effect::Highlight { .. } => "highlight",
            Effect::Registers { .. } => "registers",
            Effect::Memory { .. } => "memory",
            Effect::ClockCount { .. } => "clockCount",
            Effect::Breakpoints { .. } => "breakpoints",
            Effect::RunState { .. } => "runState",
            Effect::Stopped { .. } => "stopped",
            Effect::Continued => "continued",
            Effect::ScheduleBurst => "scheduleBurst",
        }
    }
}
