//! GPIO / peripheral pin assignments for the ESP32-C3 button board.
//!
//! Every driver references this module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Dimmable LED (LEDC PWM)
// ---------------------------------------------------------------------------

/// LED anode, driven by LEDC channel 0.  Used both for the logical on/off
/// toggle and for the pulse animation.
pub const LED_GPIO: i32 = 3;

// ---------------------------------------------------------------------------
// Push button
// ---------------------------------------------------------------------------

/// Button input.  Interrupt on the rising edge, internal pull-down.
pub const BUTTON_GPIO: i32 = 10;

/// Neighbouring pins driven LOW at boot.  The button module's return path
/// is wired to these, so they must sink current before the first press.
pub const BUTTON_RETURN_GPIOS: [i32; 2] = [4, 8];

// ---------------------------------------------------------------------------
// Console UART (command protocol + log output)
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 21;
pub const UART_RX_GPIO: i32 = 20;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  10-bit gives 0 – 1023 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 10;

/// Full-scale duty for [`PWM_RESOLUTION_BITS`].
pub const PWM_MAX_DUTY: u16 = (1 << PWM_RESOLUTION_BITS) - 1;
