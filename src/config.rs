//! Device configuration parameters
//!
//! All tunables for the PulseLink firmware.  Built once at boot from
//! defaults; nothing here survives a power cycle.

use serde::{Deserialize, Serialize};

use crate::drivers::pulse::PulseProfile;

/// Socket phases of one HTTP exchange that each get the full
/// `http_timeout_ms`: connect, request write, response headers, body read.
pub const HTTP_TIMEOUT_PHASES: u32 = 4;

/// Core device configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    // --- Animation ---
    /// Brightness ramp shape used by button presses and the `pulse` command.
    pub pulse: PulseProfile,

    // --- Button ---
    /// Minimum spacing between accepted button edges (milliseconds)
    pub debounce_ms: u32,

    // --- Control loop ---
    /// Sleep between control-loop iterations (milliseconds)
    pub loop_interval_ms: u32,
    /// Emit a heartbeat frame on every loop iteration
    pub heartbeat: bool,

    // --- Peripherals ---
    /// LEDC PWM frequency for the LED (Hz)
    pub led_pwm_freq_hz: u32,
    /// Console UART baud rate
    pub serial_baud: u32,
    /// Per-operation socket timeout of the HTTP client (milliseconds)
    pub http_timeout_ms: u32,

    // --- Supervision ---
    /// Task watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            pulse: PulseProfile::default(),

            debounce_ms: 300,

            loop_interval_ms: 10, // ~100 Hz
            heartbeat: true,

            led_pwm_freq_hz: 1_000,
            serial_baud: 115_200,
            http_timeout_ms: 3_000,

            watchdog_timeout_ms: 15_000,
        }
    }
}

impl DeviceConfig {
    /// Upper bound on one HTTP exchange that times out in every phase.
    pub fn http_exchange_ceiling_ms(&self) -> u32 {
        HTTP_TIMEOUT_PHASES.saturating_mul(self.http_timeout_ms)
    }

    /// Longest stretch the control loop goes without feeding the watchdog.
    ///
    /// The loop feeds after a pulse and after a request, so only the longer
    /// of the two counts, plus one idle sleep.
    pub fn longest_unfed_ms(&self) -> u32 {
        self.pulse
            .cycle_ms
            .saturating_mul(2)
            .max(self.http_exchange_ceiling_ms())
            .saturating_add(self.loop_interval_ms)
    }
}
