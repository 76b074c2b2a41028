//! Inbound commands to the device service.
//!
//! One command per line, a JSON object tagged by its `cmd` field:
//!
//! ```text
//! {"cmd":"set_url","url":"http://10.0.0.2/hook"}
//! ```
//!
//! The same type is serialised by the host client, so both ends agree on
//! field names by construction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

/// Commands the host can send to the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Flip the logical LED flag and drive the output fully on or off.
    Led,
    CheckWifi,
    ConnectWifi {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ssid: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
    DisconnectWifi,
    GetIp,
    /// Play one brightness pulse.  Blocks the device for the whole animation.
    Pulse,
    SetUrl {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    SetMethod {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<String>,
    },
    SetDataTemplate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data_template: Option<String>,
    },
    SendRequest,
    DumpHttp,
    /// Any `cmd` value this firmware does not know.
    #[serde(other)]
    Unknown,
}

impl Command {
    /// Parse one protocol line.
    ///
    /// Lines that are not a JSON object are protocol errors and get no
    /// reply.  An object without a string `cmd` is an [`Command::Unknown`]
    /// and gets the usual "Invalid command" reply.
    pub fn parse_line(line: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(line.trim())
            .map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;

        let Value::Object(ref map) = value else {
            return Err(ProtocolError::NotAnObject);
        };

        if !matches!(map.get("cmd"), Some(Value::String(_))) {
            return Ok(Self::Unknown);
        }

        serde_json::from_value(value).map_err(|e| ProtocolError::BadField(e.to_string()))
    }

    /// Wire name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Led => "led",
            Self::CheckWifi => "check_wifi",
            Self::ConnectWifi { .. } => "connect_wifi",
            Self::DisconnectWifi => "disconnect_wifi",
            Self::GetIp => "get_ip",
            Self::Pulse => "pulse",
            Self::SetUrl { .. } => "set_url",
            Self::SetMethod { .. } => "set_method",
            Self::SetDataTemplate { .. } => "set_data_template",
            Self::SendRequest => "send_request",
            Self::DumpHttp => "dump_http",
            Self::Unknown => "unknown",
        }
    }
}
