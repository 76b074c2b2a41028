//! Outbound protocol frames.
//!
//! ```text
//! {"val":"LED toggled"}        success
//! {"error":"URL or method not set"}
//! {"status":"heartbeat"}       unsolicited, once per loop iteration
//! ```

use core::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Exactly one of these answers every parsed command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Val(Value),
    Error(String),
}

impl Response {
    pub fn val(v: impl Into<Value>) -> Self {
        Self::Val(v.into())
    }

    pub fn error(e: impl Display) -> Self {
        Self::Error(e.to_string())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Serialise to one protocol line (no terminator).
    pub fn to_line(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!("{{\"error\":\"unserialisable response: {e}\"}}"))
    }
}

/// The liveness frame emitted between responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub status: HeartbeatStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartbeatStatus {
    Heartbeat,
}

/// Pre-rendered heartbeat line.
pub const HEARTBEAT_LINE: &str = r#"{"status":"heartbeat"}"#;

impl Heartbeat {
    pub const fn new() -> Self {
        Self {
            status: HeartbeatStatus::Heartbeat,
        }
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}

/// What a raw line read back from the device turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Response(Response),
    Heartbeat,
    /// Log output, echoes, partial lines.
    Other(String),
}

impl Frame {
    pub fn classify(line: &str) -> Self {
        let trimmed = line.trim();
        if serde_json::from_str::<Heartbeat>(trimmed).is_ok() {
            return Self::Heartbeat;
        }
        match serde_json::from_str::<Response>(trimmed) {
            Ok(resp) => Self::Response(resp),
            Err(_) => Self::Other(line.to_owned()),
        }
    }
}
