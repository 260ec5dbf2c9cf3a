mod breakpoints;
mod context;
mod controller;
mod effects;
mod inspector;
mod stepping;
mod window;

pub use breakpoints::Breakpoints;
pub use context::SessionState;
pub use controller::{Controller, ControllerConfig};
pub use effects::{Effect, StatusLevel, StatusMessage, TraceLine};
pub use inspector::{Cell, Inspector, Snapshot};
pub use stepping::{next_phase, Phase, PhaseEvent, StopReason, DEFAULT_BURST_SIZE};
pub use window::{MemoryWindow, WindowError, ROW_BYTES};
