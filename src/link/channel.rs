//! Line framing over a [`Transport`].

use super::codec::{LineDecoder, encode_line};
use super::transport::Transport;

/// Pairs a transport with a decoder that persists across polls.
pub struct LineChannel<T: Transport> {
    transport: T,
    decoder: LineDecoder,
}

impl<T: Transport> LineChannel<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            decoder: LineDecoder::new(),
        }
    }

    /// Read until one line completes or the transport runs dry.
    ///
    /// Reads a byte at a time so nothing past the first complete line is
    /// pulled out of the transport; the next line stays queued for the next
    /// loop iteration.  Never blocks beyond what `Transport::read` does.
    pub fn poll_line(&mut self) -> Result<Option<String>, T::Error> {
        let mut byte = [0u8; 1];
        loop {
            if self.transport.read(&mut byte)? == 0 {
                return Ok(None);
            }
            if let Some(line) = self.decoder.push(byte[0]) {
                return Ok(Some(line));
            }
        }
    }

    /// Write `payload` as one line and flush.
    pub fn send_line(&mut self, payload: &str) -> Result<(), T::Error> {
        let frame = encode_line(payload);
        let mut written = 0;
        while written < frame.len() {
            let n = self.transport.write(&frame[written..])?;
            if n == 0 {
                break;
            }
            written += n;
        }
        self.transport.flush()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}
