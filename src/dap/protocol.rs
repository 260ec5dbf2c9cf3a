use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, BufRead, Write};

#[derive(Debug, Serialize, Deserialize)]
pub struct DapMessage {
    pub seq: u64,
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(flatten)]
    pub content: DapMessageContent,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DapMessageContent {
    Request {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<Value>,
    },
    Response {
        request_seq: u64,
        success: bool,
        command: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        body: Option<Value>,
    },
    Event {
        event: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        body: Option<Value>,
    },
}

impl DapMessage {
    pub fn request(seq: u64, command: &str, arguments: Option<Value>) -> Self {
        Self {
            seq,
            msg_type: "request".to_string(),
            content: DapMessageContent::Request {
                command: command.to_string(),
                arguments,
            },
        }
    }

    pub fn is_request(&self) -> bool {
        self.msg_type == "request"
    }
}

/// Read one `Content-Length` framed message. `Ok(None)` at end of input.
pub fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<DapMessage>> {
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim_end();
        if line.is_empty() {
            if content_length.is_some() {
                break;
            }
            continue;
        }
        if let Some(len) = line.strip_prefix("Content-Length:") {
            let len = len
                .trim()
                .parse()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            content_length = Some(len);
        }
    }

    let mut buffer = vec![0u8; content_length.unwrap_or(0)];
    reader.read_exact(&mut buffer)?;
    // The frame is consumed either way, so a bad body leaves the stream in sync.
    let msg = serde_json::from_slice(&buffer)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(msg))
}

/// Frame must be exactly `Content-Length: {len}\r\n\r\n{json}`.
pub fn write_message<W: Write>(out: &mut W, msg: &DapMessage) -> io::Result<()> {
    let json = serde_json::to_string(msg)?;
    write!(out, "Content-Length: {}\r\n\r\n{}", json.len(), json)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn frames_round_trip() {
        let mut wire = Vec::new();
        let msg = DapMessage::request(3, "next", Some(json!({"threadId": 1})));
        write_message(&mut wire, &msg).unwrap();
        assert!(wire.starts_with(b"Content-Length: "));

        let mut reader = Cursor::new(wire);
        let back = read_message(&mut reader).unwrap().unwrap();
        assert_eq!(back.seq, 3);
        assert!(back.is_request());
        match back.content {
            DapMessageContent::Request { command, arguments } => {
                assert_eq!(command, "next");
                assert_eq!(arguments, Some(json!({"threadId": 1})));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(read_message(&mut reader).unwrap().is_none());
    }

    #[test]
    fn reads_back_to_back_frames() {
        let a = r#"{"seq":1,"type":"request","command":"initialize"}"#;
        let b = r#"{"seq":2,"type":"request","command":"threads"}"#;
        let wire = format!(
            "Content-Length: {}\r\n\r\n{}Content-Length: {}\r\n\r\n{}",
            a.len(),
            a,
            b.len(),
            b
        );
        let mut reader = Cursor::new(wire.into_bytes());
        assert_eq!(read_message(&mut reader).unwrap().unwrap().seq, 1);
        assert_eq!(read_message(&mut reader).unwrap().unwrap().seq, 2);
    }

    #[test]
    fn rejects_bad_length() {
        let mut reader = Cursor::new(b"Content-Length: lots\r\n\r\n{}".to_vec());
        assert!(read_message(&mut reader).is_err());
    }
}
