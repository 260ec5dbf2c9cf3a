use super::protocol::{EngineReply, EngineRequest};
use super::{Address, Engine, EngineError, EngineInstance, RegisterIndex, Word};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

/// Spawns one engine executable per loaded program.
pub struct ProcessEngine {
    command: PathBuf,
    args: Vec<String>,
}

impl ProcessEngine {
    pub fn new(command: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

impl Engine for ProcessEngine {
    type Instance = ProcessInstance;

    fn load(&mut self, program: &str, memory_image: &str) -> Result<ProcessInstance, EngineError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(EngineError::Protocol("engine stdio not captured".to_string()));
            }
        };

        log::info!("spawned engine {} (pid {})", self.command.display(), child.id());

        let mut instance = ProcessInstance {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
        };

        let load = EngineRequest::Load {
            program: program.to_string(),
            memory_image: memory_image.to_string(),
        };
        match instance.call(&load) {
            Ok(_) => Ok(instance),
            Err(e) => {
                instance.reap();
                Err(e)
            }
        }
    }
}

/// A live engine child process speaking JSON lines.
pub struct ProcessInstance {
    child: Child,
    /// Dropped before every wait so engines reading to EOF can exit.
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl ProcessInstance {
    fn call(&mut self, request: &EngineRequest) -> Result<Value, EngineError> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        let stdin = self.stdin.as_mut().ok_or(EngineError::Closed)?;
        stdin.write_all(line.as_bytes())?;
        stdin.flush()?;

        let mut reply_line = String::new();
        loop {
            reply_line.clear();
            if self.stdout.read_line(&mut reply_line)? == 0 {
                return Err(EngineError::Closed);
            }
            // Engines may print banners; only JSON objects are replies.
            if reply_line.trim_start().starts_with('{') {
                break;
            }
            log::debug!("engine output: {}", reply_line.trim_end());
        }

        let reply: EngineReply = serde_json::from_str(reply_line.trim())?;
        if reply.ok {
            Ok(reply.value)
        } else {
            let message = reply.error.unwrap_or_else(|| "unspecified error".to_string());
            match request {
                EngineRequest::Load { .. } => Err(EngineError::Rejected(message)),
                _ => Err(EngineError::Protocol(message)),
            }
        }
    }

    fn call_value<T: DeserializeOwned>(&mut self, request: &EngineRequest) -> Result<T, EngineError> {
        let value = self.call(request)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Negative numbers and `null` both mean "no address".
    fn call_address(&mut self, request: &EngineRequest) -> Result<Option<Address>, EngineError> {
        let value: Option<i64> = self.call_value(request)?;
        match value {
            Some(v) if v >= 0 => Address::try_from(v)
                .map(Some)
                .map_err(|_| EngineError::Protocol(format!("address out of range: {}", v))),
            _ => Ok(None),
        }
    }

    fn reap(&mut self) {
        self.stdin.take();
        if let Err(e) = self.child.kill() {
            log::debug!("engine already gone: {}", e);
        }
        let _ = self.child.wait();
    }
}

impl EngineInstance for ProcessInstance {
    fn step_forward(&mut self) -> Result<Address, EngineError> {
        self.call_value(&EngineRequest::Step)
    }

    fn step_backward(&mut self) -> Result<Option<Address>, EngineError> {
        self.call_address(&EngineRequest::ReverseStep)
    }

    fn hit_breakpoint(&mut self) -> Result<Option<Address>, EngineError> {
        self.call_address(&EngineRequest::HitBreakpoint)
    }

    fn set_breakpoint(&mut self, addr: Address) -> Result<(), EngineError> {
        self.call(&EngineRequest::SetBreakpoint { addr }).map(|_| ())
    }

    fn clear_breakpoint(&mut self, addr: Address) -> Result<(), EngineError> {
        self.call(&EngineRequest::ClearBreakpoint { addr }).map(|_| ())
    }

    fn read_register(&mut self, index: RegisterIndex) -> Result<Word, EngineError> {
        self.call_value(&EngineRequest::ReadRegister {
            index: index.get() as u8,
        })
    }

    fn write_register(&mut self, index: RegisterIndex, value: Word) -> Result<(), EngineError> {
        self.call(&EngineRequest::WriteRegister {
            index: index.get() as u8,
            value,
        })
        .map(|_| ())
    }

    fn read_memory(&mut self, start: u32, end: u32) -> Result<Vec<u8>, EngineError> {
        let bytes: Vec<u8> = self.call_value(&EngineRequest::ReadMemory { start, end })?;
        let expected = end.saturating_sub(start) as usize;
        if bytes.len() != expected {
            return Err(EngineError::Protocol(format!(
                "asked for {} bytes, engine sent {}",
                expected,
                bytes.len()
            )));
        }
        Ok(bytes)
    }

    fn write_memory(&mut self, dest: u32, bytes: &[u8]) -> Result<(), EngineError> {
        self.call(&EngineRequest::WriteMemory {
            dest,
            bytes: bytes.to_vec(),
        })
        .map(|_| ())
    }

    fn dump_disassembly(&mut self) -> Result<String, EngineError> {
        self.call_value(&EngineRequest::DumpProgram)
    }

    fn serialize_memory(&mut self) -> Result<String, EngineError> {
        self.call_value(&EngineRequest::SerializeMemory)
    }

    fn clock_count(&mut self) -> Result<u64, EngineError> {
        self.call_value(&EngineRequest::ClockCount)
    }

    fn destroy(&mut self) -> Result<(), EngineError> {
        let result = self.call(&EngineRequest::Destroy).map(|_| ());
        self.stdin.take();
        if result.is_err() {
            let _ = self.child.kill();
        }
        let status = self.child.wait()?;
        log::info!("engine process exited: {}", status);
        result
    }
}
