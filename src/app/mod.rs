//! Application core: command dispatch and press handling, no direct I/O.
//!
//! Everything the core touches goes through `embedded-hal` traits or the
//! port traits in [`ports`], so the whole control loop runs on the host
//! against mock adapters.

pub mod commands;
pub mod events;
pub mod ports;
pub mod responses;
pub mod service;
pub mod template;

pub use commands::Command;
pub use responses::{Frame, Response};
pub use service::{DeviceService, DeviceState};
