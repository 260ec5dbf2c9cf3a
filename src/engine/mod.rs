//! Capability boundary to the opaque execution engine.
//!
//! The debugger never decodes or executes instructions itself. Everything it
//! knows about a running program comes through [`EngineInstance`], and every
//! instance is created by an [`Engine`] and owned by an [`EngineHandle`].

mod handle;
pub mod process;
pub mod protocol;

pub use handle::EngineHandle;
pub use process::ProcessEngine;

use std::fmt;
use std::io;
use thiserror::Error;

/// Instruction or memory address.
pub type Address = u16;

/// Register value.
pub type Word = u16;

/// Number of general purpose registers exposed by the engine.
pub const REGISTER_COUNT: usize = 8;

/// Size of the engine's byte-addressed memory.
pub const ADDRESS_SPACE: u32 = 0x1_0000;

/// Width of one instruction in bytes.
pub const INSTRUCTION_BYTES: Address = 2;

/// Index into the register file, always in `0..REGISTER_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegisterIndex(u8);

impl RegisterIndex {
    pub fn new(index: usize) -> Option<Self> {
        if index < REGISTER_COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    pub fn all() -> impl Iterator<Item = RegisterIndex> {
        (0..REGISTER_COUNT as u8).map(RegisterIndex)
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RegisterIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine's own grammar refused the program or memory image.
    #[error("engine rejected the sources: {0}")]
    Rejected(String),

    #[error("engine i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("malformed engine message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("engine protocol error: {0}")]
    Protocol(String),

    #[error("engine process exited")]
    Closed,
}

/// Factory for engine instances.
pub trait Engine {
    type Instance: EngineInstance;

    /// Build a fresh instance from program and memory-image source text.
    fn load(&mut self, program: &str, memory_image: &str) -> Result<Self::Instance, EngineError>;
}

/// Operations available on one live engine instance.
///
/// `None` results are the engine's "no such address" sentinels, not failures.
pub trait EngineInstance {
    /// Execute one clock cycle and return the address of the next instruction.
    fn step_forward(&mut self) -> Result<Address, EngineError>;

    /// Undo one clock cycle. Returns `None` at the start of history.
    fn step_backward(&mut self) -> Result<Option<Address>, EngineError>;

    /// Breakpoint triggered by the last forward step, if any.
    fn hit_breakpoint(&mut self) -> Result<Option<Address>, EngineError>;

    fn set_breakpoint(&mut self, addr: Address) -> Result<(), EngineError>;

    fn clear_breakpoint(&mut self, addr: Address) -> Result<(), EngineError>;

    fn read_register(&mut self, index: RegisterIndex) -> Result<Word, EngineError>;

    fn write_register(&mut self, index: RegisterIndex, value: Word) -> Result<(), EngineError>;

    /// Bytes in `[start, end)`.
    fn read_memory(&mut self, start: u32, end: u32) -> Result<Vec<u8>, EngineError>;

    fn write_memory(&mut self, dest: u32, bytes: &[u8]) -> Result<(), EngineError>;

    /// One mnemonic line per instruction, starting at address 0.
    fn dump_disassembly(&mut self) -> Result<String, EngineError>;

    fn serialize_memory(&mut self) -> Result<String, EngineError>;

    fn clock_count(&mut self) -> Result<u64, EngineError>;

    /// Release everything tied to this instance. Called once, by [`EngineHandle`].
    fn destroy(&mut self) -> Result<(), EngineError>;
}
