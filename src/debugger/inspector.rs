use super::window::MemoryWindow;
use crate::engine::{EngineError, EngineInstance, RegisterIndex, Word, REGISTER_COUNT};
use serde::Serialize;

/// One displayed value and whether it changed since it was last displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cell<T> {
    pub value: T,
    pub changed: bool,
}

/// A full register and memory-window reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub registers: Vec<Cell<Word>>,
    pub memory_start: u32,
    pub memory: Vec<Cell<u8>>,
}

/// Remembers what the view last showed so changes can be emphasized.
///
/// Reads the engine, never writes it.
#[derive(Debug, Clone)]
pub struct Inspector {
    registers: [Option<Word>; REGISTER_COUNT],
    window: MemoryWindow,
    memory: Vec<Option<u8>>,
}

impl Inspector {
    pub fn new(window: MemoryWindow) -> Self {
        Self {
            registers: [None; REGISTER_COUNT],
            window,
            memory: vec![None; window.len()],
        }
    }

    pub fn window(&self) -> MemoryWindow {
        self.window
    }

    /// Switch the displayed range. Cells of a new range have no displayed value yet.
    ///
    /// Returns `false` when the window is unchanged.
    pub fn set_window(&mut self, window: MemoryWindow) -> bool {
        if window == self.window {
            return false;
        }
        self.window = window;
        self.memory = vec![None; window.len()];
        true
    }

    pub fn sync<I: EngineInstance>(&mut self, engine: &mut I) -> Result<Snapshot, EngineError> {
        let mut registers = Vec::with_capacity(REGISTER_COUNT);
        for index in RegisterIndex::all() {
            let value = engine.read_register(index)?;
            registers.push(value);
        }
        let bytes = engine.read_memory(self.window.start(), self.window.end())?;
        Ok(self.reconcile(&registers, &bytes))
    }

    /// Compare fresh values against what is displayed and adopt them.
    pub fn reconcile(&mut self, registers: &[Word], bytes: &[u8]) -> Snapshot {
        let registers = registers
            .iter()
            .zip(self.registers.iter_mut())
            .map(|(&value, shown)| mark(value, shown))
            .collect();
        let memory = bytes
            .iter()
            .zip(self.memory.iter_mut())
            .map(|(&value, shown)| mark(value, shown))
            .collect();

        Snapshot {
            registers,
            memory_start: self.window.start(),
            memory,
        }
    }
}

fn mark<T: Copy + PartialEq>(value: T, shown: &mut Option<T>) -> Cell<T> {
    let changed = *shown != Some(value);
    *shown = Some(value);
    Cell { value, changed }
}
