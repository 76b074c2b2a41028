//! Serial transport client.
//!
//! The protocol has no correlation IDs.  A reply is recognised purely by its
//! shape: the first line starting with `{"val` after a command was written.
//! Heartbeats, log output and error frames are skipped while polling.
//!
//! ```text
//! write  {"cmd":"get_ip"}\r\n
//! read   {"status":"heartbeat"}      skip      attempt 1
//! read   I (5120) wifi: ...          skip      attempt 2
//! read   {"val":"192.168.4.2"}       match     attempt 3
//! ```
//!
//! Waiting is bounded by an attempt count, not a wall-clock deadline: each
//! attempt reads one line (or times out) and then sleeps `attempt_delay`.
//!
//! Connecting resets the board, so [`DeviceClient::connect`] waits for the
//! first heartbeat before handing the link out.  Commands written while the
//! firmware is still booting are lost.

use std::io::{self, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use serde_json::Value;

use crate::app::{Command, Frame, Response};

/// Literal prefix of a success reply.
pub const RESPONSE_PREFIX: &str = "{\"val";

/// Byte channel with modem control lines.
pub trait SerialLink: Read + Write {
    fn set_dtr(&mut self, level: bool) -> io::Result<()>;
    fn set_rts(&mut self, level: bool) -> io::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Lines read per command before giving up.
    pub attempts: u32,
    /// Sleep after each non-matching line.
    pub attempt_delay: Duration,
    /// Hold time with DTR/RTS low during the reset pulse.
    pub reset_settle: Duration,
    /// Upper bound on draining stale input after reset.  A running device
    /// never goes quiet (heartbeats), so the drain cannot wait for silence.
    pub drain_window: Duration,
    /// How long to wait for the first heartbeat after the drain.  Zero skips
    /// the wait.
    pub ready_timeout: Duration,
    /// Per-read timeout configured on the port.
    pub read_timeout: Duration,
    pub baud: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            attempts: 10,
            attempt_delay: Duration::from_millis(1),
            reset_settle: Duration::from_millis(100),
            drain_window: Duration::from_millis(500),
            ready_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(1),
            baud: 115_200,
        }
    }
}

pub struct DeviceClient<S: SerialLink> {
    link: S,
    cfg: ClientConfig,
    ready: bool,
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

impl<S: SerialLink> DeviceClient<S> {
    /// Reset the device through DTR/RTS, drop whatever it had buffered and
    /// wait for the firmware loop to come up.
    ///
    /// A device that never sends a heartbeat (heartbeat disabled, or still
    /// booting after `ready_timeout`) is not an error; the first command
    /// simply runs the risk of being lost.
    pub fn connect(link: S, cfg: ClientConfig) -> io::Result<Self> {
        let mut client = Self {
            link,
            cfg,
            ready: false,
        };
        client.reset()?;
        let stale = client.drain()?;
        client.ready = client.wait_ready()?;
        if client.ready {
            info!("client: link ready ({} stale bytes dropped)", stale);
        } else if !client.cfg.ready_timeout.is_zero() {
            warn!(
                "client: no heartbeat within {:?}; sending anyway",
                client.cfg.ready_timeout
            );
        }
        Ok(client)
    }

    fn reset(&mut self) -> io::Result<()> {
        self.link.set_dtr(false)?;
        self.link.set_rts(false)?;
        thread::sleep(self.cfg.reset_settle);
        self.link.set_dtr(true)?;
        self.link.set_rts(true)?;
        Ok(())
    }

    /// Read until the port is quiet or the drain window closes.
    fn drain(&mut self) -> io::Result<usize> {
        let deadline = Instant::now() + self.cfg.drain_window;
        let mut buf = [0u8; 100];
        let mut total = 0;
        while Instant::now() < deadline {
            match self.link.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if is_timeout(&e) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }

    /// Read lines until one is a heartbeat or `ready_timeout` passes.
    fn wait_ready(&mut self) -> io::Result<bool> {
        if self.cfg.ready_timeout.is_zero() {
            return Ok(false);
        }
        let deadline = Instant::now() + self.cfg.ready_timeout;
        while Instant::now() < deadline {
            if let Some(line) = self.next_line()? {
                if Frame::classify(&line) == Frame::Heartbeat {
                    return Ok(true);
                }
                trace!("client: boot {:?}", line);
            }
        }
        Ok(false)
    }

    /// Whether a heartbeat was seen while connecting.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Send one command and wait for its reply.
    ///
    /// `None` means no reply arrived within the attempt budget.  Transport
    /// failures come back as `Some(Response::Error(..))`.
    pub fn send_command(&mut self, cmd: &Command) -> Option<Response> {
        match serde_json::to_value(cmd) {
            Ok(v) => self.send_json(&v),
            Err(e) => Some(Response::error(e)),
        }
    }

    /// Like [`send_command`](Self::send_command) for an arbitrary JSON object.
    pub fn send_json(&mut self, cmd: &Value) -> Option<Response> {
        match self.exchange(cmd) {
            Ok(reply) => reply,
            Err(e) => Some(Response::error(e)),
        }
    }

    fn exchange(&mut self, cmd: &Value) -> io::Result<Option<Response>> {
        let mut frame = cmd.to_string().into_bytes();
        frame.extend_from_slice(b"\r\n");
        debug!("client: -> {}", cmd);
        self.link.write_all(&frame)?;
        self.link.flush()?;

        for attempt in 1..=self.cfg.attempts {
            if let Some(line) = self.next_line()? {
                if line.starts_with(RESPONSE_PREFIX) {
                    debug!("client: <- {} (attempt {})", line, attempt);
                    return Ok(Some(serde_json::from_str(&line).unwrap_or_else(|e| {
                        Response::error(format!("malformed response: {e}"))
                    })));
                }
                trace!("client: skip {:?}", line);
            }
            thread::sleep(self.cfg.attempt_delay);
        }
        debug!("client: no reply after {} attempts", self.cfg.attempts);
        Ok(None)
    }

    /// Read one line.  A read timeout ends the line early: whatever arrived
    /// is returned, and `None` if nothing did.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut raw = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match self.link.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    if byte[0] == b'\n' {
                        break;
                    }
                    raw.push(byte[0]);
                }
                Err(e) if is_timeout(&e) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&raw).trim().to_owned()))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }

    pub fn link_mut(&mut self) -> &mut S {
        &mut self.link
    }

    pub fn into_inner(self) -> S {
        self.link
    }
}
