use super::protocol::{write_message, DapMessage, DapMessageContent};
use crate::app::App;
use crate::buffers::{BufferName, BufferStore};
use crate::debugger::Effect;
use crate::engine::{Address, Engine};
use crate::executor::{Flow, Frontend};
use crate::parser::parse_number;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

const THREAD_ID: u64 = 1;

/// Debug Adapter Protocol binding. Requests map onto controller operations;
/// effects go back to the client as events named after the effect.
pub struct DapServer<W: Write> {
    seq: u64,
    out: W,
}

impl<W: Write> DapServer<W> {
    pub fn new(out: W) -> Self {
        Self { seq: 0, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    pub fn send_response(
        &mut self,
        request_seq: u64,
        command: &str,
        success: bool,
        message: Option<String>,
        body: Option<Value>,
    ) -> io::Result<()> {
        let msg = DapMessage {
            seq: self.next_seq(),
            msg_type: "response".to_string(),
            content: DapMessageContent::Response {
                request_seq,
                success,
                command: command.to_string(),
                message,
                body,
            },
        };
        write_message(&mut self.out, &msg)
    }

    fn ok(&mut self, request_seq: u64, command: &str, body: Option<Value>) -> io::Result<()> {
        self.send_response(request_seq, command, true, None, body)
    }

    fn fail(&mut self, request_seq: u64, command: &str, message: String) -> io::Result<()> {
        log::warn!("{} failed: {}", command, message);
        self.send_response(request_seq, command, false, Some(message), None)
    }

    pub fn send_event(&mut self, event: &str, body: Option<Value>) -> io::Result<()> {
        let msg = DapMessage {
            seq: self.next_seq(),
            msg_type: "event".to_string(),
            content: DapMessageContent::Event {
                event: event.to_string(),
                body,
            },
        };
        write_message(&mut self.out, &msg)
    }

    fn send_effect(&mut self, effect: &Effect) -> io::Result<()> {
        match effect {
            Effect::ScheduleBurst => Ok(()),
            Effect::Stopped { reason, address } => self.send_event(
                "stopped",
                Some(json!({
                    "reason": reason,
                    "threadId": THREAD_ID,
                    "allThreadsStopped": true,
                    "address": address,
                })),
            ),
            Effect::Continued => self.send_event(
                "continued",
                Some(json!({
                    "threadId": THREAD_ID,
                    "allThreadsContinued": true,
                })),
            ),
            other => {
                let body = serde_json::to_value(other)?.get("body").cloned();
                self.send_event(other.name(), body)
            }
        }
    }

    fn dispatch<E: Engine, S: BufferStore>(
        &mut self,
        app: &mut App<E, S>,
        seq: u64,
        command: &str,
        args: &Value,
    ) -> io::Result<Flow> {
        let controller = &mut app.controller;
        let effects = match command {
            "initialize" => {
                self.ok(
                    seq,
                    command,
                    Some(json!({
                        "supportsConfigurationDoneRequest": true,
                        "supportsStepBack": true,
                        "supportsInstructionBreakpoints": true,
                        "supportsConditionalBreakpoints": false,
                        "supportsSetVariable": false,
                    })),
                )?;
                self.send_event("initialized", None)?;
                return Ok(Flow::Continue(Vec::new()));
            }
            "launch" => {
                if let Err(message) = read_launch_sources(app, args) {
                    self.fail(seq, command, message)?;
                    return Ok(Flow::Continue(Vec::new()));
                }
                self.ok(seq, command, None)?;
                app.load_session()
            }
            "configurationDone" => {
                self.ok(seq, command, None)?;
                Vec::new()
            }
            "threads" => {
                self.ok(
                    seq,
                    command,
                    Some(json!({ "threads": [{ "id": THREAD_ID, "name": "exasm" }] })),
                )?;
                Vec::new()
            }
            "next" => {
                self.ok(seq, command, None)?;
                controller.step_forward()
            }
            "stepBack" => {
                self.ok(seq, command, None)?;
                controller.step_backward()
            }
            "continue" => {
                self.ok(seq, command, Some(json!({ "allThreadsContinued": true })))?;
                if controller.state().is_running() {
                    Vec::new()
                } else {
                    controller.toggle_run()
                }
            }
            "pause" => {
                self.ok(seq, command, None)?;
                controller.request_interrupt()
            }
            "setInstructionBreakpoints" => {
                let wanted = instruction_breakpoints(args);
                let mut effects = Vec::new();
                let current: BTreeSet<Address> = controller.breakpoints().into_iter().collect();
                let desired: BTreeSet<Address> = wanted.iter().flatten().copied().collect();
                for addr in current.symmetric_difference(&desired) {
                    effects.extend(controller.toggle_breakpoint(*addr));
                }
                let now = controller.breakpoints();
                let verified: Vec<Value> = wanted
                    .iter()
                    .map(|addr| match addr {
                        Some(addr) => json!({
                            "verified": now.contains(addr),
                            "instructionReference": format!("{:#x}", addr),
                        }),
                        None => json!({ "verified": false }),
                    })
                    .collect();
                self.ok(seq, command, Some(json!({ "breakpoints": verified })))?;
                effects
            }
            "toggleBreakpoint" => match args.get("address").and_then(address_of) {
                Some(addr) => {
                    self.ok(seq, command, None)?;
                    controller.toggle_breakpoint(addr)
                }
                None => {
                    self.fail(seq, command, "missing or invalid address".to_string())?;
                    Vec::new()
                }
            },
            "setMemoryWindow" => {
                let start = args.get("start").map(text_of).unwrap_or_default();
                let end = args.get("end").map(text_of).unwrap_or_default();
                let effects = controller.set_window(&start, &end);
                let window = controller.window();
                self.ok(
                    seq,
                    command,
                    Some(json!({ "start": window.start(), "end": window.end() })),
                )?;
                effects
            }
            "applyRegisters" => {
                self.ok(seq, command, None)?;
                controller.apply_registers(fields_of(args).as_slice())
            }
            "applyMemory" => {
                self.ok(seq, command, None)?;
                controller.apply_memory(fields_of(args).as_slice())
            }
            "switchBuffer" => match buffer_of(args) {
                Ok(name) => {
                    let effects = app.switch_buffer(name);
                    let surface = serde_json::to_value(app.buffers.surface())?;
                    self.ok(seq, command, Some(surface))?;
                    effects
                }
                Err(message) => {
                    self.fail(seq, command, message)?;
                    Vec::new()
                }
            },
            "editBuffer" => {
                let name = match args.get("name") {
                    Some(_) => buffer_of(args),
                    None => Ok(app.buffers.active()),
                };
                match (name, args.get("content").and_then(Value::as_str)) {
                    (Ok(name), Some(content)) => {
                        app.buffers.replace(name, content);
                        self.ok(seq, command, None)?;
                    }
                    (Err(message), _) => self.fail(seq, command, message)?,
                    (Ok(_), None) => self.fail(seq, command, "missing content".to_string())?,
                }
                Vec::new()
            }
            "exportDisassembly" => match controller.export_disassembly() {
                Ok(text) => {
                    self.ok(seq, command, Some(json!({ "text": text })))?;
                    Vec::new()
                }
                Err(e) => {
                    self.fail(seq, command, e.to_string())?;
                    controller.report(e)
                }
            },
            "exportMemory" => match controller.export_memory() {
                Ok(text) => {
                    self.ok(seq, command, Some(json!({ "text": text })))?;
                    match args.get("dir").and_then(Value::as_str) {
                        Some(dir) => app.download_memory(Some(Path::new(dir))),
                        None => Vec::new(),
                    }
                }
                Err(e) => {
                    self.fail(seq, command, e.to_string())?;
                    controller.report(e)
                }
            },
            "clearStatus" => {
                self.ok(seq, command, None)?;
                controller.clear_status()
            }
            "disconnect" => {
                self.ok(seq, command, None)?;
                return Ok(Flow::Quit);
            }
            other => {
                self.fail(seq, other, format!("unsupported request: {}", other))?;
                Vec::new()
            }
        };
        Ok(Flow::Continue(effects))
    }
}

impl<W: Write, E: Engine, S: BufferStore> Frontend<E, S> for DapServer<W> {
    type Request = DapMessage;

    fn handle(&mut self, app: &mut App<E, S>, msg: DapMessage) -> io::Result<Flow> {
        if !msg.is_request() {
            log::debug!("ignoring {} message {}", msg.msg_type, msg.seq);
            return Ok(Flow::Continue(Vec::new()));
        }
        match msg.content {
            DapMessageContent::Request { command, arguments } => {
                log::debug!("request {} #{}", command, msg.seq);
                let args = arguments.unwrap_or(Value::Null);
                self.dispatch(app, msg.seq, &command, &args)
            }
            _ => Ok(Flow::Continue(Vec::new())),
        }
    }

    fn render(&mut self, effects: &[Effect]) -> io::Result<()> {
        for effect in effects {
            self.send_effect(effect)?;
        }
        Ok(())
    }
}

/// Replace buffers with the files named by `program` and `memoryImage`.
fn read_launch_sources<E: Engine, S: BufferStore>(
    app: &mut App<E, S>,
    args: &Value,
) -> Result<(), String> {
    for (key, name) in [
        ("program", BufferName::Program),
        ("memoryImage", BufferName::MemoryImage),
    ] {
        if let Some(path) = args.get(key).and_then(Value::as_str) {
            let content =
                fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path, e))?;
            app.buffers.replace(name, content);
        }
    }
    Ok(())
}

/// A JSON number or string as the text a user would have typed.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn address_of(value: &Value) -> Option<Address> {
    parse_number(&text_of(value))
}

fn fields_of(args: &Value) -> Vec<String> {
    args.get("values")
        .and_then(Value::as_array)
        .map(|values| values.iter().map(text_of).collect())
        .unwrap_or_default()
}

fn buffer_of(args: &Value) -> Result<BufferName, String> {
    args.get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing buffer name".to_string())?
        .parse()
}

/// Requested instruction breakpoints; `None` for references that do not parse.
fn instruction_breakpoints(args: &Value) -> Vec<Option<Address>> {
    let requested = match args.get("breakpoints").and_then(Value::as_array) {
        Some(list) => list,
        None => return Vec::new(),
    };
    requested
        .iter()
        .map(|bp| {
            let base = bp.get("instructionReference").and_then(address_of)?;
            let offset = bp.get("offset").and_then(Value::as_i64).unwrap_or(0);
            Address::try_from(i64::from(base) + offset).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_strings_are_user_text() {
        assert_eq!(text_of(&json!("0x10")), "0x10");
        assert_eq!(text_of(&json!(16)), "16");
        assert_eq!(text_of(&json!(null)), "");
        assert_eq!(address_of(&json!("0x6")), Some(6));
    }

    #[test]
    fn instruction_breakpoints_apply_offsets() {
        let args = json!({
            "breakpoints": [
                { "instructionReference": "0x10", "offset": -2 },
                { "instructionReference": "4" },
                { "instructionReference": "main" },
            ]
        });
        assert_eq!(instruction_breakpoints(&args), vec![Some(14), Some(4), None]);
    }
}
