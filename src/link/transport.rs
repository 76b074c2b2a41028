//! Transport abstraction: any byte-oriented channel.
//!
//! Concrete implementations:
//! - UART console (`adapters::serial::UartTransport`)
//! - In-memory loopback in the integration tests
//!
//! The control loop is generic over `Transport`, so moving the protocol to
//! another byte channel requires no changes to command handling.

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;
}
