//! Host side of the serial link.
//!
//! [`DeviceClient`] pairs each command with its reply over a line-buffered
//! serial port that also carries heartbeats and firmware log output.  It is
//! generic over [`SerialLink`], implemented for `serialport` ports in
//! [`serial`] and by in-memory mocks in the tests.

pub mod client;
pub mod serial;
pub mod session;

pub use client::{ClientConfig, DeviceClient, RESPONSE_PREFIX, SerialLink};
pub use session::{SessionLine, parse_session_line};
