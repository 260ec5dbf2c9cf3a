//! Clock-by-clock debugger session controller for exasm programs.
//!
//! The instruction set itself lives in an external engine; this crate drives
//! it one cycle at a time, keeps breakpoints and run state, tracks which
//! registers and memory cells changed, and serves the result to a terminal
//! prompt or a Debug Adapter Protocol client.

pub mod app;
pub mod buffers;
pub mod config;
pub mod dap;
pub mod debugger;
pub mod engine;
pub mod error;
pub mod executor;
pub mod parser;

pub use app::App;
pub use error::{ControlError, ControlResult};
