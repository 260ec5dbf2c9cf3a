use super::numbers::parse_number;
use crate::buffers::BufferName;
use crate::engine::Address;
use crate::executor::keymap::Key;
use std::path::PathBuf;

/// A line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load,
    /// Bare shortcut key: empty line steps forward, `-` steps back.
    Key(Key),
    Next,
    Prev,
    /// Start a run, or interrupt the one in progress.
    Continue,
    Interrupt,
    Break(Address),
    ListBreakpoints,
    Window { start: String, end: String },
    Registers(Vec<String>),
    Memory(Vec<String>),
    Buffer(BufferName),
    Show,
    EditSet { line: usize, text: String },
    EditLoad(PathBuf),
    Cursor { line: usize, column: usize },
    Copy(Option<PathBuf>),
    Download(Option<PathBuf>),
    Clear,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  load                     save both buffers and load them into a fresh engine
  <enter> | -              forward / backward shortcut key
  n, next | p, prev        step one clock cycle forward / backward
  c, continue              run, or interrupt the current run
  i, interrupt             stop the run at the next burst boundary
  b, break <addr>          toggle a breakpoint
  bl                       list breakpoints
  w, window <start> <end>  show memory [start, end)
  regs <r0> .. <r7>        write registers (invalid fields are skipped)
  mem <byte>..             write the memory window from its start
  buf program|memory       switch the editing surface
  show                     print the active buffer
  edit set <line> <text>   replace one line of the active buffer
  edit load <path>         replace the active buffer with a file
  cursor <line> <col>      move the active buffer's cursor
  copy [path]              print the disassembly, or write it to a file
  download [dir]           write mem.inc
  clear                    dismiss the status message
  q, quit";

/// Split a prompt line with shell quoting rules and parse it.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Command::Key(Key::Forward));
    }
    if trimmed == "-" {
        return Ok(Command::Key(Key::Backward));
    }

    let words = shlex::split(trimmed).ok_or_else(|| "unbalanced quotes".to_string())?;
    let (name, args) = match words.split_first() {
        Some((name, args)) => (name.as_str(), args),
        None => return Ok(Command::Key(Key::Forward)),
    };

    let command = match name {
        "load" => Command::Load,
        "n" | "next" => Command::Next,
        "p" | "prev" => Command::Prev,
        "c" | "continue" => Command::Continue,
        "i" | "interrupt" => Command::Interrupt,
        "b" | "break" => {
            let addr = args.first().ok_or("usage: break <addr>")?;
            let addr =
                parse_number::<Address>(addr).ok_or_else(|| format!("invalid address: {}", addr))?;
            Command::Break(addr)
        }
        "bl" => Command::ListBreakpoints,
        "w" | "window" => match args {
            [start, end] => Command::Window {
                start: start.clone(),
                end: end.clone(),
            },
            _ => return Err("usage: window <start> <end>".to_string()),
        },
        "regs" => Command::Registers(args.to_vec()),
        "mem" => Command::Memory(args.to_vec()),
        "buf" => {
            let name = args.first().ok_or("usage: buf program|memory")?;
            Command::Buffer(name.parse()?)
        }
        "show" => Command::Show,
        "edit" => parse_edit(args)?,
        "cursor" => match args {
            [line, column] => Command::Cursor {
                line: parse_number(line).ok_or_else(|| format!("invalid line: {}", line))?,
                column: parse_number(column)
                    .ok_or_else(|| format!("invalid column: {}", column))?,
            },
            _ => return Err("usage: cursor <line> <col>".to_string()),
        },
        "copy" => Command::Copy(args.first().map(PathBuf::from)),
        "download" => Command::Download(args.first().map(PathBuf::from)),
        "clear" => Command::Clear,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {}", other)),
    };
    Ok(command)
}

fn parse_edit(args: &[String]) -> Result<Command, String> {
    match args {
        [op, line, text @ ..] if op == "set" => {
            let line = parse_number(line)
                .filter(|&n: &usize| n > 0)
                .ok_or_else(|| format!("invalid line: {}", line))?;
            Ok(Command::EditSet {
                line,
                text: text.join(" "),
            })
        }
        [op, path] if op == "load" => Ok(Command::EditLoad(PathBuf::from(path))),
        _ => Err("usage: edit set <line> <text> | edit load <path>".to_string()),
    }
}
