//! Error types for the PulseLink firmware and host client.
//!
//! Every subsystem error renders (via `Display`) to the exact message that
//! goes on the wire inside an `{"error": ...}` response, so handlers can
//! convert any failure with `to_string()` and keep the control loop alive.

use core::fmt;

// ---------------------------------------------------------------------------
// Request template errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Template does not contain the `$$` marker.
    MissingMarker,
    /// Template contains the `$$` marker more than once.
    RepeatedMarker,
    /// `set_data_template` was called without a template.
    TemplateRequired,
    /// Rendering needs both a template and a value provider.
    RenderUnavailable,
    /// Sending needs both a URL and a method.
    TargetUnset,
    /// The HTTP exchange failed.
    Http(HttpError),
    /// The response body was not valid JSON.
    InvalidResponse(String),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMarker => write!(f, "Data template must contain $$"),
            Self::RepeatedMarker => write!(f, "Data template must contain $$ exactly once"),
            Self::TemplateRequired => write!(f, "Data template is required"),
            Self::RenderUnavailable => {
                write!(f, "Data template or get data function not set")
            }
            Self::TargetUnset => write!(f, "URL or method not set"),
            Self::Http(e) => write!(f, "{e}"),
            Self::InvalidResponse(msg) => write!(f, "invalid response JSON: {msg}"),
        }
    }
}

impl std::error::Error for TemplateError {}

impl From<HttpError> for TemplateError {
    fn from(e: HttpError) -> Self {
        Self::Http(e)
    }
}

// ---------------------------------------------------------------------------
// Pulse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PulseError {
    /// Writing a duty value to the PWM output failed at `step`.
    DutyWrite { step: u32, reason: String },
}

impl fmt::Display for PulseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DutyWrite { step, reason } => {
                write!(f, "PWM duty write failed at step {step}: {reason}")
            }
        }
    }
}

impl std::error::Error for PulseError {}

// ---------------------------------------------------------------------------
// HTTP errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// The configured method is not one the client can issue.
    UnsupportedMethod(String),
    /// Connection, send or receive failure.
    Transport(String),
    /// No network stack on this target.
    Unavailable,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedMethod(m) => write!(f, "unsupported HTTP method: {m}"),
            Self::Transport(msg) => write!(f, "{msg}"),
            Self::Unavailable => write!(f, "HTTP client unavailable"),
        }
    }
}

impl std::error::Error for HttpError {}

// ---------------------------------------------------------------------------
// WiFi errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiError {
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed(String),
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed(msg) => write!(f, "WiFi connection failed: {msg}"),
        }
    }
}

impl std::error::Error for WifiError {}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The line is not JSON at all.
    InvalidJson(String),
    /// The line is JSON but not an object.
    NotAnObject,
    /// A recognised command carried a malformed field.
    BadField(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson(msg) => write!(f, "invalid JSON: {msg}"),
            Self::NotAnObject => write!(f, "command must be a JSON object"),
            Self::BadField(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ProtocolError {}
