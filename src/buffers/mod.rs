//! The two editable sources a session is loaded from.

mod store;

pub use store::{BufferStore, JsonFileStore, MemoryStore, StoreError};

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

const DEFAULT_PROGRAM: &str = "\
lli r0, 0x30 # start of the table
lli r1, 0x40 # one past the end

# a leading @name labels the line;
# branches and jumps can use it as a target
@fill sw r2, (r0)
addi r0, 2
mov r3, r1
sub r3, r0
bnez r3, @fill
nop

# spin here once the table is written
@halt j @halt
nop";

const DEFAULT_MEMORY_IMAGE: &str = "\
@30 00000001 00000010
@32 00000011 00000100
@34 00000101 00000110
@36 00000111 00001000
@38 00001001 00001010
@3a 00001011 00001100
@3c 00001101 00001110
@3e 00001111 00010000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BufferName {
    Program,
    MemoryImage,
}

impl BufferName {
    /// Storage key.
    pub fn key(self) -> &'static str {
        match self {
            BufferName::Program => "program",
            BufferName::MemoryImage => "memoryImage",
        }
    }

    fn default_content(self) -> &'static str {
        match self {
            BufferName::Program => DEFAULT_PROGRAM,
            BufferName::MemoryImage => DEFAULT_MEMORY_IMAGE,
        }
    }
}

impl fmt::Display for BufferName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BufferName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "program" | "prog" => Ok(BufferName::Program),
            "memoryImage" | "memory" | "mem" => Ok(BufferName::MemoryImage),
            other => Err(format!("unknown buffer: {}", other)),
        }
    }
}

/// Cursor and scroll position of an editor view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub line: usize,
    pub column: usize,
    pub scroll_top: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Buffer {
    pub name: BufferName,
    pub content: String,
    pub view: ViewState,
}

/// Both sources read for a session load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub program: String,
    pub memory_image: String,
}

/// Holds the program and memory-image buffers. The active one lives in the
/// shared editing surface; the other is parked with its content and view.
pub struct BufferManager<S: BufferStore> {
    store: S,
    surface: Buffer,
    parked: Buffer,
}

impl<S: BufferStore> BufferManager<S> {
    /// Start with the program buffer active. Persisted content wins over defaults.
    pub fn new(store: S) -> Self {
        let surface = Self::restore(&store, BufferName::Program);
        let parked = Self::restore(&store, BufferName::MemoryImage);
        Self {
            store,
            surface,
            parked,
        }
    }

    fn restore(store: &S, name: BufferName) -> Buffer {
        let content = match store.read(name.key()) {
            Ok(Some(content)) => content,
            Ok(None) => name.default_content().to_string(),
            Err(e) => {
                log::warn!("using default {} buffer: {}", name, e);
                name.default_content().to_string()
            }
        };
        Buffer {
            name,
            content,
            view: ViewState::default(),
        }
    }

    pub fn active(&self) -> BufferName {
        self.surface.name
    }

    /// The buffer currently in the editing surface.
    pub fn surface(&self) -> &Buffer {
        &self.surface
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn buffer(&self, name: BufferName) -> &Buffer {
        if self.surface.name == name {
            &self.surface
        } else {
            &self.parked
        }
    }

    fn buffer_mut(&mut self, name: BufferName) -> &mut Buffer {
        if self.surface.name == name {
            &mut self.surface
        } else {
            &mut self.parked
        }
    }

    pub fn content(&self, name: BufferName) -> &str {
        &self.buffer(name).content
    }

    pub fn view(&self, name: BufferName) -> ViewState {
        self.buffer(name).view
    }

    /// Replace the text in the editing surface.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.surface.content = content.into();
    }

    /// Replace a named buffer's text whether or not it is active.
    pub fn replace(&mut self, name: BufferName, content: impl Into<String>) {
        self.buffer_mut(name).content = content.into();
    }

    /// Replace 1-based line `line` of the editing surface, appending empty
    /// lines if the buffer is shorter.
    pub fn set_line(&mut self, line: usize, text: &str) -> bool {
        if line == 0 {
            return false;
        }
        let mut lines: Vec<&str> = self.surface.content.lines().collect();
        while lines.len() < line {
            lines.push("");
        }
        lines[line - 1] = text;
        self.surface.content = lines.join("\n");
        self.surface.view.line = line;
        self.surface.view.column = text.len();
        true
    }

    pub fn set_view(&mut self, view: ViewState) {
        self.surface.view = view;
    }

    /// Make `name` the active buffer. The outgoing buffer keeps its content and
    /// view in memory and is persisted under its name.
    ///
    /// Returns `Ok(false)` if `name` was already active.
    pub fn switch_to(&mut self, name: BufferName) -> Result<bool, StoreError> {
        if self.surface.name == name {
            return Ok(false);
        }
        std::mem::swap(&mut self.surface, &mut self.parked);
        log::debug!("editing surface now shows {}", name);
        self.store.write(self.parked.name.key(), &self.parked.content)?;
        Ok(true)
    }

    /// Persist both buffers regardless of which is active.
    pub fn persist_all(&mut self) -> Result<(), StoreError> {
        self.store.write(self.surface.name.key(), &self.surface.content)?;
        self.store.write(self.parked.name.key(), &self.parked.content)
    }

    pub fn sources(&self) -> Sources {
        Sources {
            program: self.content(BufferName::Program).to_string(),
            memory_image: self.content(BufferName::MemoryImage).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_content_wins_over_default() {
        let store = MemoryStore::new().with("memoryImage", "@00 00000001 00000000");
        let buffers = BufferManager::new(store);
        assert_eq!(buffers.active(), BufferName::Program);
        assert_eq!(buffers.content(BufferName::Program), DEFAULT_PROGRAM);
        assert_eq!(
            buffers.content(BufferName::MemoryImage),
            "@00 00000001 00000000"
        );
    }

    #[test]
    fn switch_keeps_content_and_view() {
        let mut buffers = BufferManager::new(MemoryStore::new());
        buffers.set_content("nop\nnop");
        buffers.set_view(ViewState {
            line: 2,
            column: 3,
            scroll_top: 0,
        });

        assert!(buffers.switch_to(BufferName::MemoryImage).unwrap());
        assert_eq!(buffers.store().get("program"), Some("nop\nnop"));
        assert_eq!(buffers.surface().content, DEFAULT_MEMORY_IMAGE);

        assert!(buffers.switch_to(BufferName::Program).unwrap());
        assert_eq!(buffers.surface().content, "nop\nnop");
        assert_eq!(buffers.view(BufferName::Program).line, 2);
        assert_eq!(buffers.view(BufferName::Program).column, 3);

        assert!(!buffers.switch_to(BufferName::Program).unwrap());
        assert_eq!(buffers.store().writes(), 2);
    }

    #[test]
    fn set_line_extends_short_buffers() {
        let mut buffers = BufferManager::new(MemoryStore::new());
        buffers.set_content("a");
        assert!(buffers.set_line(3, "c"));
        assert_eq!(buffers.surface().content, "a\n\nc");
        assert!(!buffers.set_line(0, "x"));
    }

    #[test]
    fn buffer_names_parse() {
        assert_eq!("mem".parse::<BufferName>(), Ok(BufferName::MemoryImage));
        assert_eq!("program".parse::<BufferName>(), Ok(BufferName::Program));
        assert!("data".parse::<BufferName>().is_err());
    }
}
