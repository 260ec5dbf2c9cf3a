use super::host::{Flow, Frontend, Host};
use super::keymap::{self, Action};
use crate::app::App;
use crate::buffers::{BufferStore, ViewState};
use crate::debugger::{Cell, Effect, StatusLevel, StatusMessage, TraceLine, ROW_BYTES};
use crate::engine::{Address, Engine, Word};
use crate::parser::{parse_command, Command, HELP};
use std::fs;
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{channel, Sender};
use std::thread;

/// Line-oriented front end: reads commands, prints effects as text.
pub struct Repl<W: Write> {
    out: W,
    prompt: bool,
}

impl<W: Write> Repl<W> {
    pub fn new(out: W) -> Self {
        Self { out, prompt: true }
    }

    /// No `> ` before each read; for scripted input.
    pub fn without_prompt(mut self) -> Self {
        self.prompt = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn execute<E: Engine, S: BufferStore>(
        &mut self,
        app: &mut App<E, S>,
        command: Command,
    ) -> io::Result<Flow> {
        let controller = &mut app.controller;
        let effects = match command {
            Command::Load => app.load_session(),
            Command::Key(key) => {
                let halted = controller.state().halted_at().is_some();
                match keymap::shortcut(key, false, halted) {
                    Some(Action::StepForward) => controller.step_forward(),
                    Some(Action::StepBackward) => controller.step_backward(),
                    Some(Action::Interrupt) => controller.request_interrupt(),
                    None => Vec::new(),
                }
            }
            Command::Next => controller.step_forward(),
            Command::Prev => controller.step_backward(),
            Command::Continue => controller.toggle_run(),
            Command::Interrupt => controller.request_interrupt(),
            Command::Break(addr) => controller.toggle_breakpoint(addr),
            Command::ListBreakpoints => {
                write_breakpoints(&mut self.out, &controller.breakpoints())?;
                Vec::new()
            }
            Command::Window { start, end } => {
                let effects = controller.set_window(&start, &end);
                let window = controller.window();
                writeln!(self.out, "window {:#06x}..{:#06x}", window.start(), window.end())?;
                effects
            }
            Command::Registers(fields) => controller.apply_registers(fields.as_slice()),
            Command::Memory(fields) => controller.apply_memory(fields.as_slice()),
            Command::Buffer(name) => {
                let effects = app.switch_buffer(name);
                self.show(app)?;
                effects
            }
            Command::Show => {
                self.show(app)?;
                Vec::new()
            }
            Command::EditSet { line, text } => {
                app.buffers.set_line(line, &text);
                Vec::new()
            }
            Command::EditLoad(path) => match fs::read_to_string(&path) {
                Ok(content) => {
                    app.buffers.set_content(content);
                    Vec::new()
                }
                Err(e) => controller.notify(StatusMessage::error(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                ))),
            },
            Command::Cursor { line, column } => {
                let scroll_top = app.buffers.surface().view.scroll_top;
                app.buffers.set_view(ViewState {
                    line,
                    column,
                    scroll_top,
                });
                Vec::new()
            }
            Command::Copy(path) => match controller.export_disassembly() {
                Ok(text) => match path {
                    Some(path) => match fs::write(&path, text) {
                        Ok(()) => controller.notify(StatusMessage::info(format!(
                            "Disassembly written to {}",
                            path.display()
                        ))),
                        Err(e) => controller.report(e.into()),
                    },
                    None => {
                        writeln!(self.out, "{}", text.trim_end())?;
                        Vec::new()
                    }
                },
                Err(e) => controller.report(e),
            },
            Command::Download(dir) => app.download_memory(dir.as_deref()),
            Command::Clear => controller.clear_status(),
            Command::Help => {
                writeln!(self.out, "{}", HELP)?;
                Vec::new()
            }
            Command::Quit => return Ok(Flow::Quit),
        };
        Ok(Flow::Continue(effects))
    }

    fn show<E: Engine, S: BufferStore>(&mut self, app: &App<E, S>) -> io::Result<()> {
        let surface = app.buffers.surface();
        writeln!(self.out, "[{}]", surface.name)?;
        for (n, line) in surface.content.lines().enumerate() {
            let marker = if n + 1 == surface.view.line { '>' } else { ' ' };
            writeln!(self.out, "{}{:4} {}", marker, n + 1, line)?;
        }
        Ok(())
    }
}

impl<W: Write, E: Engine, S: BufferStore> Frontend<E, S> for Repl<W> {
    type Request = String;

    fn handle(&mut self, app: &mut App<E, S>, line: String) -> io::Result<Flow> {
        match parse_command(&line) {
            Ok(command) => self.execute(app, command),
            Err(message) => {
                writeln!(self.out, "{}", message)?;
                Ok(Flow::Continue(Vec::new()))
            }
        }
    }

    fn render(&mut self, effects: &[Effect]) -> io::Result<()> {
        for effect in effects {
            render_effect(&mut self.out, effect)?;
        }
        self.out.flush()
    }

    fn waiting(&mut self) -> io::Result<()> {
        if self.prompt {
            write!(self.out, "> ")?;
            self.out.flush()?;
        }
        Ok(())
    }
}

pub fn render_effect<W: Write>(out: &mut W, effect: &Effect) -> io::Result<()> {
    match effect {
        Effect::Status { message: Some(msg) } => match msg.level {
            StatusLevel::Info => writeln!(out, "info: {}", msg.text),
            StatusLevel::Warning => writeln!(out, "warning: {}", msg.text),
            StatusLevel::Error => writeln!(out, "error: {}", msg.text),
        },
        Effect::Status { message: None } => Ok(()),
        Effect::Trace { lines } => write_trace(out, lines),
        Effect::Highlight {
            address: Some(addr),
            breakpoint_hit,
        } => {
            if *breakpoint_hit {
                writeln!(out, "=> {:#06x} (breakpoint)", addr)
            } else {
                writeln!(out, "=> {:#06x}", addr)
            }
        }
        Effect::Highlight { address: None, .. } => writeln!(out, "=> (none)"),
        Effect::Registers { cells } => write_registers(out, cells),
        Effect::Memory { start, cells } => write_memory(out, *start, cells),
        Effect::ClockCount { cycles } => writeln!(out, "clock: {}", cycles),
        Effect::Breakpoints { addresses } => write_breakpoints(out, addresses),
        Effect::RunState { running, halted } => {
            let state = match (*running, *halted) {
                (true, _) => "running",
                (false, true) => "halted",
                (false, false) => "idle",
            };
            writeln!(out, "[{}]", state)
        }
        Effect::Stopped { .. } | Effect::Continued | Effect::ScheduleBurst => Ok(()),
    }
}

fn write_trace<W: Write>(out: &mut W, lines: &[TraceLine]) -> io::Result<()> {
    for line in lines {
        let marker = if line.breakpoint { '*' } else { ' ' };
        writeln!(out, "{} {:#06x}  {}", marker, line.address, line.text)?;
    }
    Ok(())
}

fn write_registers<W: Write>(out: &mut W, cells: &[Cell<Word>]) -> io::Result<()> {
    let fields: Vec<String> = cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let mark = if cell.changed { "*" } else { "" };
            format!("r{}={:#06x}{}", i, cell.value, mark)
        })
        .collect();
    writeln!(out, "{}", fields.join(" "))
}

fn write_memory<W: Write>(out: &mut W, start: u32, cells: &[Cell<u8>]) -> io::Result<()> {
    let row_start = (start..).step_by(ROW_BYTES as usize);
    for (addr, chunk) in row_start.zip(cells.chunks(ROW_BYTES as usize)) {
        write!(out, "{:#06x}:", addr)?;
        for cell in chunk {
            let mark = if cell.changed { '*' } else { ' ' };
            write!(out, " {:02x}{}", cell.value, mark)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_breakpoints<W: Write>(out: &mut W, addresses: &[Address]) -> io::Result<()> {
    if addresses.is_empty() {
        return writeln!(out, "breakpoints: none");
    }
    let list: Vec<String> = addresses.iter().map(|a| format!("{:#06x}", a)).collect();
    writeln!(out, "breakpoints: {}", list.join(", "))
}

/// Forward stdin lines to the host loop until EOF.
pub fn spawn_line_reader(tx: Sender<String>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("stdin: {}", e);
                    break;
                }
            }
        }
    })
}

/// Run the interactive prompt on stdin/stdout.
pub fn run_interactive_mode<E: Engine, S: BufferStore>(app: App<E, S>) -> io::Result<()> {
    let (tx, rx) = channel();
    let _reader = spawn_line_reader(tx);

    eprintln!("Type `help` for commands, `load` to start.");
    let mut repl = Repl::new(io::stdout());
    let mut host = Host::new(app);
    host.run(&mut repl, &rx)
}
