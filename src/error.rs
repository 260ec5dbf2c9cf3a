use crate::buffers::StoreError;
use crate::engine::{Address, EngineError};
use thiserror::Error;

/// Failures of a controller operation. All of them are reported as status
/// messages; none stop the debugger.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Program not loaded")]
    NoProgramLoaded,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("breakpoint address {0:#06x} is not instruction aligned")]
    MisalignedBreakpoint(Address),

    #[error("export failed: {0}")]
    Export(#[from] std::io::Error),
}

pub type ControlResult<T> = Result<T, ControlError>;
