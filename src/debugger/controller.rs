use super::context::SessionState;
use super::effects::{Effect, StatusMessage, TraceLine};
use super::inspector::Inspector;
use super::stepping::{PhaseEvent, StopReason, DEFAULT_BURST_SIZE};
use super::window::MemoryWindow;
use crate::config::BreakpointPolicy;
use crate::engine::{
    Address, Engine, EngineHandle, EngineInstance, RegisterIndex, INSTRUCTION_BYTES,
};
use crate::error::{ControlError, ControlResult};
use crate::parser::parse_number;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub burst_size: usize,
    pub breakpoint_policy: BreakpointPolicy,
    pub window: MemoryWindow,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            burst_size: DEFAULT_BURST_SIZE,
            breakpoint_policy: BreakpointPolicy::Carry,
            window: MemoryWindow::default(),
        }
    }
}

enum StepOutcome {
    Advanced(Address),
    Halted(Address),
}

/// Drives one engine instance under the session's breakpoint and interrupt
/// policy. Every operation returns the view effects it produced.
pub struct Controller<E: Engine> {
    engine: E,
    handle: Option<EngineHandle<E::Instance>>,
    state: SessionState,
    inspector: Inspector,
    burst_size: usize,
    policy: BreakpointPolicy,
}

impl<E: Engine> Controller<E> {
    pub fn new(engine: E, config: &ControllerConfig) -> Self {
        Self {
            engine,
            handle: None,
            state: SessionState::new(),
            inspector: Inspector::new(config.window),
            burst_size: config.burst_size.max(1),
            policy: config.breakpoint_policy,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    pub fn window(&self) -> MemoryWindow {
        self.inspector.window()
    }

    pub fn breakpoints(&self) -> Vec<Address> {
        self.state.breakpoints.to_vec()
    }

    /// Replace the engine instance with a fresh one built from the sources.
    pub fn load(&mut self, program: &str, memory_image: &str) -> Vec<Effect> {
        let mut effects = Vec::new();
        effects.extend(self.state.transition(PhaseEvent::Unloaded));
        self.state.set_current_address(None);

        if let Some(old) = self.handle.take() {
            if let Err(e) = old.close() {
                log::warn!("previous engine did not shut down cleanly: {}", e);
            }
        }

        let instance = match self.engine.load(program, memory_image) {
            Ok(instance) => instance,
            Err(e) => {
                log::warn!("load failed: {}", e);
                effects.push(Effect::Trace { lines: Vec::new() });
                effects.push(Effect::Highlight {
                    address: None,
                    breakpoint_hit: false,
                });
                effects.push(
                    self.state
                        .set_status(StatusMessage::error(format!("Failed to load program: {}", e))),
                );
                return effects;
            }
        };
        self.handle = Some(EngineHandle::new(instance));
        log::info!("program loaded");

        if self.policy == BreakpointPolicy::Reset {
            self.state.breakpoints.clear();
        }
        effects.extend(self.state.clear_status());

        match self.after_load() {
            Ok(more) => effects.extend(more),
            Err(e) => effects.extend(self.report(e)),
        }
        effects
    }

    fn after_load(&mut self) -> ControlResult<Vec<Effect>> {
        let handle = self.handle.as_mut().ok_or(ControlError::NoProgramLoaded)?;
        for addr in self.state.breakpoints.iter() {
            handle.set_breakpoint(addr)?;
        }

        let mut effects = vec![
            Effect::Trace {
                lines: self.trace()?,
            },
            Effect::Breakpoints {
                addresses: self.breakpoints(),
            },
        ];
        self.state.set_current_address(Some(0));
        effects.push(Effect::Highlight {
            address: Some(0),
            breakpoint_hit: false,
        });
        effects.extend(self.sync()?);
        effects.push(Effect::Stopped {
            reason: StopReason::Entry,
            address: Some(0),
        });
        Ok(effects)
    }

    fn trace(&mut self) -> ControlResult<Vec<TraceLine>> {
        let handle = self.handle.as_mut().ok_or(ControlError::NoProgramLoaded)?;
        let dump = handle.dump_disassembly()?;
        let lines = dump
            .lines()
            .filter(|line| !line.is_empty())
            .zip((0..=Address::MAX).step_by(INSTRUCTION_BYTES as usize))
            .map(|(text, address)| TraceLine {
                address,
                text: text.to_string(),
                breakpoint: self.state.breakpoints.contains(address),
            })
            .collect();
        Ok(lines)
    }

    /// Read registers, the memory window and the clock count.
    fn sync(&mut self) -> ControlResult<Vec<Effect>> {
        let handle = self.handle.as_mut().ok_or(ControlError::NoProgramLoaded)?;
        let snapshot = self.inspector.sync(&mut **handle)?;
        let cycles = handle.clock_count()?;
        let mut effects = Vec::from(Effect::from_snapshot(snapshot));
        effects.push(Effect::ClockCount { cycles });
        Ok(effects)
    }

    fn step_once(&mut self) -> ControlResult<StepOutcome> {
        let handle = self.handle.as_mut().ok_or(ControlError::NoProgramLoaded)?;
        let next = handle.step_forward()?;
        match handle.hit_breakpoint()? {
            Some(addr) => Ok(StepOutcome::Halted(addr)),
            None => Ok(StepOutcome::Advanced(next)),
        }
    }

    fn halt(&mut self, addr: Address) -> ControlResult<Vec<Effect>> {
        if !self.state.breakpoints.contains(addr) {
            log::warn!("engine halted at {:#06x}, which has no breakpoint", addr);
        }
        let mut effects = Vec::new();
        effects.extend(self.state.transition(PhaseEvent::BreakpointHit(addr)));
        self.state.set_current_address(Some(addr));
        effects.push(Effect::Highlight {
            address: Some(addr),
            breakpoint_hit: true,
        });
        effects.extend(self.sync()?);
        effects.push(Effect::Stopped {
            reason: StopReason::Breakpoint,
            address: Some(addr),
        });
        Ok(effects)
    }

    pub fn step_forward(&mut self) -> Vec<Effect> {
        if !self.is_loaded() {
            return self.report(ControlError::NoProgramLoaded);
        }
        let mut effects = Vec::new();
        effects.extend(self.state.transition(PhaseEvent::ManualStep));
        match self.forward() {
            Ok(more) => effects.extend(more),
            Err(e) => effects.extend(self.report(e)),
        }
        effects
    }

    fn forward(&mut self) -> ControlResult<Vec<Effect>> {
        match self.step_once()? {
            StepOutcome::Halted(addr) => self.halt(addr),
            StepOutcome::Advanced(next) => {
                self.state.set_current_address(Some(next));
                let mut effects = vec![Effect::Highlight {
                    address: Some(next),
                    breakpoint_hit: false,
                }];
                effects.extend(self.sync()?);
                effects.push(Effect::Stopped {
                    reason: StopReason::Step,
                    address: Some(next),
                });
                Ok(effects)
            }
        }
    }

    pub fn step_backward(&mut self) -> Vec<Effect> {
        if !self.is_loaded() {
            return self.report(ControlError::NoProgramLoaded);
        }
        let mut effects = Vec::new();
        effects.extend(self.state.transition(PhaseEvent::ManualStep));
        match self.backward() {
            Ok(more) => effects.extend(more),
            Err(e) => effects.extend(self.report(e)),
        }
        effects
    }

    fn backward(&mut self) -> ControlResult<Vec<Effect>> {
        let handle = self.handle.as_mut().ok_or(ControlError::NoProgramLoaded)?;
        let addr = handle.step_backward()?;
        self.state.set_current_address(addr);
        let mut effects = vec![Effect::Highlight {
            address: addr,
            breakpoint_hit: false,
        }];
        effects.extend(self.sync()?);
        effects.push(Effect::Stopped {
            reason: StopReason::StepBack,
            address: addr,
        });
        Ok(effects)
    }

    /// Start a run, or interrupt the one in progress.
    pub fn toggle_run(&mut self) -> Vec<Effect> {
        if self.state.is_running() {
            return self.request_interrupt();
        }
        if !self.is_loaded() {
            return self.report(ControlError::NoProgramLoaded);
        }
        let mut effects = Vec::new();
        effects.extend(self.state.transition(PhaseEvent::StartRun));
        effects.push(Effect::Continued);
        effects.extend(self.run_burst());
        effects
    }

    /// Takes effect at the next burst boundary.
    pub fn request_interrupt(&mut self) -> Vec<Effect> {
        self.state.request_interrupt();
        Vec::new()
    }

    /// Execute one burst of a run. Called by the host loop for every
    /// `ScheduleBurst` it received; does nothing unless a run is in progress.
    pub fn run_burst(&mut self) -> Vec<Effect> {
        if !self.state.is_running() {
            return Vec::new();
        }
        if self.state.interrupt_requested() {
            return self.stop_run();
        }
        match self.burst() {
            Ok(effects) => effects,
            Err(e) => self.report(e),
        }
    }

    fn burst(&mut self) -> ControlResult<Vec<Effect>> {
        let mut view = Vec::new();
        for _ in 0..self.burst_size {
            match self.step_once()? {
                StepOutcome::Halted(addr) => return self.halt(addr),
                StepOutcome::Advanced(next) => {
                    self.state.set_current_address(Some(next));
                    view = self.sync()?;
                }
            }
        }

        let mut effects = vec![Effect::Highlight {
            address: self.state.current_address(),
            breakpoint_hit: false,
        }];
        effects.extend(view);
        if self.state.interrupt_requested() {
            effects.extend(self.stop_run());
        } else {
            effects.push(Effect::ScheduleBurst);
        }
        Ok(effects)
    }

    fn stop_run(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        effects.extend(self.state.transition(PhaseEvent::Interrupted));
        effects.push(Effect::Stopped {
            reason: StopReason::Pause,
            address: self.state.current_address(),
        });
        effects
    }

    pub fn toggle_breakpoint(&mut self, addr: Address) -> Vec<Effect> {
        if addr % INSTRUCTION_BYTES != 0 {
            return self.report(ControlError::MisalignedBreakpoint(addr));
        }
        let now_set = self.state.breakpoints.toggle(addr);
        if let Some(handle) = self.handle.as_mut() {
            let applied = if now_set {
                handle.set_breakpoint(addr)
            } else {
                handle.clear_breakpoint(addr)
            };
            if let Err(e) = applied {
                self.state.breakpoints.toggle(addr);
                return self.report(e.into());
            }
        }
        vec![Effect::Breakpoints {
            addresses: self.breakpoints(),
        }]
    }

    /// Change the displayed memory range. Unparseable or inverted bounds leave
    /// the window as it was.
    pub fn set_window(&mut self, start: &str, end: &str) -> Vec<Effect> {
        let window = match (parse_number::<u32>(start), parse_number::<u32>(end)) {
            (Some(start), Some(end)) => MemoryWindow::new(start, end),
            _ => {
                log::debug!("ignoring window bounds {:?}..{:?}", start, end);
                return Vec::new();
            }
        };
        match window {
            Ok(window) => self.set_window_range(window),
            Err(e) => {
                log::debug!("ignoring {}", e);
                Vec::new()
            }
        }
    }

    pub fn set_window_range(&mut self, window: MemoryWindow) -> Vec<Effect> {
        if self.inspector.set_window(window) {
            log::debug!("memory window now {:#x}..{:#x}", window.start(), window.end());
        }
        if !self.is_loaded() {
            return Vec::new();
        }
        match self.sync() {
            Ok(effects) => effects,
            Err(e) => self.report(e),
        }
    }

    /// Write the register fields that parse; skip the rest.
    pub fn apply_registers<S: AsRef<str>>(&mut self, fields: &[S]) -> Vec<Effect> {
        match self.write_registers(fields) {
            Ok(effects) => effects,
            Err(e) => self.report(e),
        }
    }

    fn write_registers<S: AsRef<str>>(&mut self, fields: &[S]) -> ControlResult<Vec<Effect>> {
        let handle = self.handle.as_mut().ok_or(ControlError::NoProgramLoaded)?;
        for (index, field) in RegisterIndex::all().zip(fields) {
            match parse_number::<u16>(field.as_ref()) {
                Some(value) => handle.write_register(index, value)?,
                None => log::debug!("skipping {} value {:?}", index, field.as_ref()),
            }
        }
        self.sync()
    }

    /// Overwrite the window's bytes with the fields that parse, in order from
    /// the window start.
    pub fn apply_memory<S: AsRef<str>>(&mut self, fields: &[S]) -> Vec<Effect> {
        match self.write_memory(fields) {
            Ok(effects) => effects,
            Err(e) => self.report(e),
        }
    }

    fn write_memory<S: AsRef<str>>(&mut self, fields: &[S]) -> ControlResult<Vec<Effect>> {
        let window = self.inspector.window();
        let handle = self.handle.as_mut().ok_or(ControlError::NoProgramLoaded)?;
        let mut bytes = handle.read_memory(window.start(), window.end())?;
        for (slot, field) in bytes.iter_mut().zip(fields) {
            match parse_number::<u8>(field.as_ref()) {
                Some(value) => *slot = value,
                None => log::debug!("skipping memory value {:?}", field.as_ref()),
            }
        }
        handle.write_memory(window.start(), &bytes)?;
        self.sync()
    }

    pub fn export_disassembly(&mut self) -> ControlResult<String> {
        let handle = self.handle.as_mut().ok_or(ControlError::NoProgramLoaded)?;
        Ok(handle.dump_disassembly()?)
    }

    pub fn export_memory(&mut self) -> ControlResult<String> {
        let handle = self.handle.as_mut().ok_or(ControlError::NoProgramLoaded)?;
        Ok(handle.serialize_memory()?)
    }

    pub fn clear_status(&mut self) -> Vec<Effect> {
        self.state.clear_status().into_iter().collect()
    }

    pub fn notify(&mut self, message: StatusMessage) -> Vec<Effect> {
        vec![self.state.set_status(message)]
    }

    /// Turn a failure into a status message. Engine failures also stop any run.
    pub fn report(&mut self, error: ControlError) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let ControlError::Engine(e) = &error {
            log::warn!("engine call failed: {}", e);
            effects.extend(self.state.transition(PhaseEvent::Faulted));
        }
        effects.push(self.state.set_status(StatusMessage::error(error.to_string())));
        effects
    }
}
