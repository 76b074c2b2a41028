//! ISR-debounced push button.
//!
//! ## Hardware
//!
//! Momentary switch to 3V3 with the internal pull-down enabled.  The GPIO
//! interrupt fires on the rising edge and calls [`Button::handle_edge`]
//! directly from interrupt context with the current monotonic time.
//!
//! ## Debounce
//!
//! An edge is accepted only when at least `window_ms` have elapsed since the
//! previously *accepted* edge.  Rejected edges do not move the window, so a
//! burst of contact bounce collapses into one press.  A genuine second press
//! inside the window is lost; the window is short enough that this only
//! affects deliberate double taps.
//!
//! ## ISR contract
//!
//! `handle_edge` does a timestamp comparison, two atomic stores and at most
//! one call of the registered callback.  The callback must be ISR-safe too:
//! in the firmware it only raises the [`PressLatch`](crate::events::PressLatch)
//! and the control loop does the slow work.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::OnceLock;

use log::info;

use crate::pins;

/// Default debounce window.
pub const DEBOUNCE_MS: u32 = 300;

/// Callback invoked once per accepted press.
pub type PressCallback = fn();

/// Returned when a second callback is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackAlreadySet;

impl core::fmt::Display for CallbackAlreadySet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "button press callback already registered")
    }
}

impl std::error::Error for CallbackAlreadySet {}

pub struct Button {
    gpio: i32,
    window_ms: AtomicU32,
    /// Timestamp of the last accepted edge.  Meaningless until `armed`.
    last_accepted_ms: AtomicU32,
    armed: AtomicBool,
    presses: AtomicU32,
    on_press: OnceLock<PressCallback>,
}

/// The board's single button, shared between the GPIO ISR and the main loop.
pub static BUTTON: Button = Button::new(pins::BUTTON_GPIO, DEBOUNCE_MS);

impl Button {
    pub const fn new(gpio: i32, window_ms: u32) -> Self {
        Self {
            gpio,
            window_ms: AtomicU32::new(window_ms),
            last_accepted_ms: AtomicU32::new(0),
            armed: AtomicBool::new(false),
            presses: AtomicU32::new(0),
            on_press: OnceLock::new(),
        }
    }

    /// GPIO pin this button is attached to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Replace the debounce window.  Set once at boot, before the ISR is
    /// installed.
    pub fn set_window_ms(&self, window_ms: u32) {
        self.window_ms.store(window_ms, Ordering::Relaxed);
    }

    pub fn window_ms(&self) -> u32 {
        self.window_ms.load(Ordering::Relaxed)
    }

    /// Attach the press callback.  Only one may ever be attached.
    pub fn set_on_press(&self, callback: PressCallback) -> Result<(), CallbackAlreadySet> {
        self.on_press.set(callback).map_err(|_| CallbackAlreadySet)?;
        info!("button: callback attached on GPIO{}", self.gpio);
        Ok(())
    }

    /// Feed one raw edge.  Safe to call from interrupt context.
    /// Returns `true` when the edge counted as a press.
    pub fn handle_edge(&self, now_ms: u32) -> bool {
        if self.armed.load(Ordering::Acquire) {
            let last = self.last_accepted_ms.load(Ordering::Relaxed);
            if now_ms.wrapping_sub(last) < self.window_ms.load(Ordering::Relaxed) {
                return false;
            }
        }

        self.last_accepted_ms.store(now_ms, Ordering::Relaxed);
        self.armed.store(true, Ordering::Release);
        // Single producer: the ISR is the only writer.
        let n = self.presses.load(Ordering::Relaxed);
        self.presses.store(n.wrapping_add(1), Ordering::Relaxed);

        if let Some(callback) = self.on_press.get() {
            callback();
        }
        true
    }

    /// Accepted presses since boot.
    pub fn press_count(&self) -> u32 {
        self.presses.load(Ordering::Relaxed)
    }
}
