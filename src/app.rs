use crate::buffers::{BufferManager, BufferName, BufferStore};
use crate::debugger::{Controller, Effect, StatusMessage};
use crate::engine::Engine;
use crate::error::ControlError;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the serialized memory export.
pub const MEMORY_EXPORT_NAME: &str = "mem.inc";

/// The controller together with the buffers it loads from.
pub struct App<E: Engine, S: BufferStore> {
    pub controller: Controller<E>,
    pub buffers: BufferManager<S>,
    export_dir: PathBuf,
}

impl<E: Engine, S: BufferStore> App<E, S> {
    pub fn new(controller: Controller<E>, buffers: BufferManager<S>, export_dir: PathBuf) -> Self {
        Self {
            controller,
            buffers,
            export_dir,
        }
    }

    /// Persist both buffers, then load a fresh engine from them.
    pub fn load_session(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        let saved = self.buffers.persist_all();
        let sources = self.buffers.sources();
        effects.extend(self.controller.load(&sources.program, &sources.memory_image));
        if let Err(e) = saved {
            log::warn!("buffers not saved: {}", e);
            // A failed load keeps its own message.
            if self.controller.state().status().is_none() {
                let warning = StatusMessage::warning(format!("Buffers not saved: {}", e));
                effects.extend(self.controller.notify(warning));
            }
        }
        effects
    }

    /// Never touches the engine.
    pub fn switch_buffer(&mut self, name: BufferName) -> Vec<Effect> {
        match self.buffers.switch_to(name) {
            Ok(_) => Vec::new(),
            Err(e) => self.controller.report(e.into()),
        }
    }

    /// Write the serialized memory as `mem.inc` into `dir`, or the configured
    /// export directory.
    pub fn download_memory(&mut self, dir: Option<&Path>) -> Vec<Effect> {
        let path = dir.unwrap_or(&self.export_dir).join(MEMORY_EXPORT_NAME);
        match self.write_memory_export(&path) {
            Ok(()) => self
                .controller
                .notify(StatusMessage::info(format!("Saved {}", path.display()))),
            Err(e) => self.controller.report(e),
        }
    }

    fn write_memory_export(&mut self, path: &Path) -> Result<(), ControlError> {
        let contents = self.controller.export_memory()?;
        fs::write(path, contents)?;
        log::info!("memory exported to {}", path.display());
        Ok(())
    }
}
