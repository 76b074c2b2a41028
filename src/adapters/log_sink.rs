//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to the
//! logger, which on the device shares the console UART with the protocol.
//! None of these lines start with `{"val`, so the host skips them.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { heartbeat } => {
                info!("START | heartbeat={}", if *heartbeat { "on" } else { "off" });
            }
            AppEvent::PressHandled {
                presses,
                pulse,
                request,
            } => {
                let pulse = match pulse {
                    Ok(()) => "ok".to_owned(),
                    Err(e) => format!("error: {e}"),
                };
                let request = match request {
                    Ok(body) => body.to_string(),
                    Err(e) => format!("error: {e}"),
                };
                info!("PRESS | #{} | pulse={} | request={}", presses, pulse, request);
            }
            AppEvent::PressDropped => {
                info!("PRESS | dropped (pulse in progress)");
            }
            AppEvent::LineIgnored(reason) => {
                debug!("LINE | ignored: {}", reason);
            }
            AppEvent::LinkFault(msg) => {
                warn!("LINK | {}", msg);
            }
        }
    }
}
