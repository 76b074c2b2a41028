//! Outbound application events.
//!
//! The [`DeviceService`](super::service::DeviceService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Nothing is waiting on a
//! button press, so its outcome only ever travels this way.

use serde_json::Value;

use crate::error::{ProtocolError, PulseError, TemplateError};

/// Structured events emitted by the device service.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The control loop is about to start.
    Started { heartbeat: bool },

    /// A button press ran its pulse and then its request.
    PressHandled {
        presses: u32,
        pulse: Result<(), PulseError>,
        request: Result<Value, TemplateError>,
    },

    /// A press landed while a pulse was playing and was thrown away.
    PressDropped,

    /// A line could not be parsed and got no response.
    LineIgnored(ProtocolError),

    /// Reading or writing the command link failed.
    LinkFault(String),
}
