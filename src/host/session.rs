//! Command lines for `pulselink-host session`.
//!
//! A session keeps one port open (one board reset) and reads commands from
//! stdin, so the LED flag, WiFi association and HTTP template survive
//! between commands.
//!
//! ```text
//! set-url http://10.0.0.2/hook
//! set_method POST
//! set-data-template {"presses":$$}
//! connect-wifi lab hunter22
//! {"cmd":"dump_http"}
//! quit
//! ```

use serde_json::Value;

use crate::app::Command;

/// One parsed line of session input.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionLine {
    Command(Command),
    /// A JSON object sent as is.
    Raw(Value),
    /// Empty line or `#` comment.
    Blank,
    Quit,
}

/// Parse `name [args]` (snake or kebab case) or a raw JSON object.
pub fn parse_session_line(line: &str) -> Result<SessionLine, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(SessionLine::Blank);
    }
    if line.starts_with('{') {
        return serde_json::from_str(line)
            .map(SessionLine::Raw)
            .map_err(|e| format!("invalid JSON: {e}"));
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    let name = name.replace('-', "_");
    let optional = || (!rest.is_empty()).then(|| rest.to_owned());

    let cmd = match name.as_str() {
        "quit" | "exit" => return Ok(SessionLine::Quit),
        "set_url" => Command::SetUrl { url: optional() },
        "set_method" => Command::SetMethod { method: optional() },
        "set_data_template" => {
            if rest.is_empty() {
                return Err("usage: set_data_template <template containing $$>".into());
            }
            Command::SetDataTemplate {
                data_template: Some(rest.to_owned()),
            }
        }
        "connect_wifi" => {
            let (ssid, password) = match rest.split_once(char::is_whitespace) {
                Some((ssid, password)) => (ssid, password.trim()),
                None => (rest, ""),
            };
            if ssid.is_empty() {
                return Err("usage: connect_wifi <ssid> [password]".into());
            }
            Command::ConnectWifi {
                ssid: Some(ssid.to_owned()),
                password: Some(password.to_owned()),
            }
        }
        bare => {
            let cmd = match bare {
                "led" => Command::Led,
                "pulse" => Command::Pulse,
                "check_wifi" => Command::CheckWifi,
                "disconnect_wifi" => Command::DisconnectWifi,
                "get_ip" => Command::GetIp,
                "send_request" => Command::SendRequest,
                "dump_http" => Command::DumpHttp,
                other => return Err(format!("unknown command '{other}'")),
            };
            if !rest.is_empty() {
                return Err(format!("{bare} takes no arguments"));
            }
            cmd
        }
    };
    Ok(SessionLine::Command(cmd))
}
