//! Newline-delimited text codec.
//!
//! Wire format:
//! ```text
//! host → device:   {"cmd":"led"}\r\n
//! device → host:   {"val":"LED toggled"}\n
//! ```
//!
//! The decoder accumulates incoming bytes across loop iterations and yields
//! complete lines.  A command split over several UART reads is reassembled;
//! bytes from a line that outgrew the buffer are dropped up to the next
//! newline so the stream resynchronises on the following line.

use heapless::Vec;
use log::warn;

/// Longest accepted line, terminator excluded.
pub const MAX_LINE: usize = 1024;

/// Streaming line decoder.
pub struct LineDecoder {
    buf: Vec<u8, MAX_LINE>,
    /// Current line exceeded [`MAX_LINE`]; discard until `\n`.
    overflowed: bool,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            overflowed: false,
        }
    }

    /// Feed one byte.  Returns a line when `byte` completes one.
    ///
    /// A trailing `\r` is stripped and whitespace-only lines are skipped.
    /// Invalid UTF-8 is replaced rather than rejected; the JSON parser
    /// downstream decides whether the line means anything.
    pub fn push(&mut self, byte: u8) -> Option<String> {
        if byte != b'\n' {
            if !self.overflowed && self.buf.push(byte).is_err() {
                warn!("link: line exceeds {} bytes, discarding", MAX_LINE);
                self.overflowed = true;
                self.buf.clear();
            }
            return None;
        }

        if self.overflowed {
            self.overflowed = false;
            return None;
        }

        let mut raw: &[u8] = &self.buf;
        if let [head @ .., b'\r'] = raw {
            raw = head;
        }
        let line = String::from_utf8_lossy(raw).into_owned();
        self.buf.clear();

        if line.trim().is_empty() { None } else { Some(line) }
    }

    /// Feed a slice.  Returns every line completed by it, in order.
    pub fn feed(&mut self, data: &[u8]) -> std::vec::Vec<String> {
        data.iter().filter_map(|&b| self.push(b)).collect()
    }

    /// Bytes buffered for the line in progress.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Reset decoder state (e.g. after a transport reconnect).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }
}

/// Frame one outgoing line.  Any embedded newline is an encoder bug, so the
/// payload is written as-is and terminated with a single `\n`.
pub fn encode_line(payload: &str) -> std::vec::Vec<u8> {
    let mut out = std::vec::Vec::with_capacity(payload.len() + 1);
    out.extend_from_slice(payload.as_bytes());
    out.push(b'\n');
    out
}
