use crate::app::App;
use crate::buffers::BufferStore;
use crate::debugger::Effect;
use crate::engine::Engine;
use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{Receiver, TryRecvError};

/// Deferred work queued by the host loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Burst,
}

/// What a front end wants after handling one request.
#[derive(Debug)]
pub enum Flow {
    Continue(Vec<Effect>),
    Quit,
}

/// A view binding: turns its requests into controller calls and renders the
/// effects that come back.
pub trait Frontend<E: Engine, S: BufferStore> {
    type Request;

    fn handle(&mut self, app: &mut App<E, S>, request: Self::Request) -> io::Result<Flow>;

    fn render(&mut self, effects: &[Effect]) -> io::Result<()>;

    /// Called before the loop blocks for input.
    fn waiting(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Single-threaded event loop owning the controller. Requests arrive over a
/// channel fed by a reader thread; run bursts are queued as tasks so input is
/// seen between them.
pub struct Host<E: Engine, S: BufferStore> {
    app: App<E, S>,
    tasks: VecDeque<Task>,
}

impl<E: Engine, S: BufferStore> Host<E, S> {
    pub fn new(app: App<E, S>) -> Self {
        Self {
            app,
            tasks: VecDeque::new(),
        }
    }

    pub fn into_app(self) -> App<E, S> {
        self.app
    }

    /// Run until the front end quits or the input channel closes.
    ///
    /// Each turn handles at most one request and then at most one burst that
    /// was queued before the request arrived.
    pub fn run<F>(&mut self, frontend: &mut F, input: &Receiver<F::Request>) -> io::Result<()>
    where
        F: Frontend<E, S>,
    {
        loop {
            let request = if self.tasks.is_empty() {
                frontend.waiting()?;
                match input.recv() {
                    Ok(request) => Some(request),
                    Err(_) => break,
                }
            } else {
                match input.try_recv() {
                    Ok(request) => Some(request),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => break,
                }
            };

            let due = self.tasks.pop_front();
            if let Some(request) = request {
                match frontend.handle(&mut self.app, request)? {
                    Flow::Continue(effects) => self.deliver(frontend, effects)?,
                    Flow::Quit => {
                        log::info!("front end quit");
                        return Ok(());
                    }
                }
            }
            if let Some(Task::Burst) = due {
                let effects = self.app.controller.run_burst();
                self.deliver(frontend, effects)?;
            }
        }
        log::info!("input closed");
        Ok(())
    }

    fn deliver<F>(&mut self, frontend: &mut F, effects: Vec<Effect>) -> io::Result<()>
    where
        F: Frontend<E, S>,
    {
        if effects.contains(&Effect::ScheduleBurst) && !self.tasks.contains(&Task::Burst) {
            self.tasks.push_back(Task::Burst);
        }
        frontend.render(&effects)
    }
}
