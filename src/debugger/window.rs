use crate::engine::ADDRESS_SPACE;
use serde::Serialize;
use thiserror::Error;

/// Bytes per displayed memory row.
pub const ROW_BYTES: u32 = 8;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid memory window {start:#x}..{end:#x}")]
pub struct WindowError {
    pub start: u32,
    pub end: u32,
}

/// Displayed memory range `[start, end)`, aligned to 8-byte rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryWindow {
    start: u32,
    end: u32,
}

impl MemoryWindow {
    /// Round `start` down and `end` up to row boundaries.
    pub fn new(start: u32, end: u32) -> Result<Self, WindowError> {
        if end < start {
            return Err(WindowError { start, end });
        }
        let aligned_start = start & !(ROW_BYTES - 1);
        let aligned_end = match end % ROW_BYTES {
            0 => Some(end),
            rem => end.checked_add(ROW_BYTES - rem),
        };
        let aligned_end = match aligned_end {
            Some(e) if e <= ADDRESS_SPACE => e,
            _ => return Err(WindowError { start, end }),
        };
        Ok(Self {
            start: aligned_start,
            end: aligned_end,
        })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

}

impl Default for MemoryWindow {
    fn default() -> Self {
        Self {
            start: 0x30,
            end: 0x40,
        }
    }
}
