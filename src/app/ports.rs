//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DeviceService (domain)
//! ```
//!
//! The LED and the step delay use the `embedded-hal` traits directly
//! (`pwm::SetDutyCycle`, `delay::DelayNs`).  The network collaborators and
//! the watchdog have no standard trait, so they are defined here and
//! implemented by the adapters in [`crate::adapters`], the TWDT driver and
//! the mocks in the integration tests.

use core::net::Ipv4Addr;

use crate::error::{HttpError, WifiError};

// ───────────────────────────────────────────────────────────────
// WiFi station port
// ───────────────────────────────────────────────────────────────

pub trait WifiPort {
    /// Join `ssid`.  An empty `password` means an open network.
    /// Succeeds without reconnecting when already associated.
    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), WifiError>;

    fn disconnect(&mut self) -> Result<(), WifiError>;

    fn is_connected(&self) -> bool;

    /// Station address, `None` while not connected.
    fn ip_address(&self) -> Option<Ipv4Addr>;
}

// ───────────────────────────────────────────────────────────────
// HTTP client port
// ───────────────────────────────────────────────────────────────

/// One outbound request.  Borrowed so the template never clones its config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpRequest<'a> {
    /// Method name as configured (`GET`, `POST`, ...).  Adapters reject
    /// anything their client cannot issue.
    pub method: &'a str,
    pub url: &'a str,
    pub body: &'a str,
    pub headers: &'a [(&'a str, &'a str)],
}

pub trait HttpPort {
    /// Perform the exchange and return the response body as text.
    fn request(&mut self, req: &HttpRequest<'_>) -> Result<String, HttpError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Supervision port
// ───────────────────────────────────────────────────────────────

/// Liveness signal for whatever supervises the control loop.
///
/// [`DeviceService::poll_once`](super::service::DeviceService::poll_once)
/// feeds between its blocking steps, so the longest unfed stretch is one
/// pulse or one HTTP exchange, never both.
pub trait WatchdogPort {
    fn feed(&self);
}

/// Unsupervised loops (host tests, [`DeviceService::run`](super::service::DeviceService::run)).
impl WatchdogPort for () {
    fn feed(&self) {}
}
