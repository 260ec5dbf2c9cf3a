use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One request line sent to the engine process.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EngineRequest {
    Load {
        program: String,
        memory_image: String,
    },
    Step,
    ReverseStep,
    HitBreakpoint,
    SetBreakpoint {
        addr: u16,
    },
    ClearBreakpoint {
        addr: u16,
    },
    ReadRegister {
        index: u8,
    },
    WriteRegister {
        index: u8,
        value: u16,
    },
    ReadMemory {
        start: u32,
        end: u32,
    },
    WriteMemory {
        dest: u32,
        bytes: Vec<u8>,
    },
    DumpProgram,
    SerializeMemory,
    ClockCount,
    Destroy,
}

/// One reply line read back from the engine process.
///
/// `value` is `null` when the engine answers with its "none" sentinel.
#[derive(Debug, Serialize, Deserialize)]
pub struct EngineReply {
    pub ok: bool,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_are_tagged_by_op() {
        let line = serde_json::to_string(&EngineRequest::SetBreakpoint { addr: 6 }).unwrap();
        assert_eq!(line, r#"{"op":"set_breakpoint","addr":6}"#);

        let line = serde_json::to_string(&EngineRequest::ReverseStep).unwrap();
        assert_eq!(line, r#"{"op":"reverse_step"}"#);
    }

    #[test]
    fn reply_defaults_missing_fields() {
        let reply: EngineReply = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert!(reply.ok);
        assert!(reply.value.is_null());
        assert!(reply.error.is_none());
    }
}
