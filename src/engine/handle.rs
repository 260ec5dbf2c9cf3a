use super::{EngineError, EngineInstance};
use std::ops::{Deref, DerefMut};

/// Sole owner of a live engine instance.
///
/// The instance is destroyed exactly once: by [`EngineHandle::close`], or on
/// drop if the handle was never closed.
pub struct EngineHandle<I: EngineInstance> {
    instance: I,
    released: bool,
}

impl<I: EngineInstance> EngineHandle<I> {
    pub fn new(instance: I) -> Self {
        Self {
            instance,
            released: false,
        }
    }

    /// Destroy the instance now and report the outcome.
    pub fn close(mut self) -> Result<(), EngineError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), EngineError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.instance.destroy()
    }
}

impl<I: EngineInstance> Deref for EngineHandle<I> {
    type Target = I;

    fn deref(&self) -> &I {
        &self.instance
    }
}

impl<I: EngineInstance> DerefMut for EngineHandle<I> {
    fn deref_mut(&mut self) -> &mut I {
        &mut self.instance
    }
}

impl<I: EngineInstance> Drop for EngineHandle<I> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("failed to destroy engine instance: {}", e);
        }
    }
}
