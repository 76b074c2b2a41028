//! Interrupt-to-loop press hand-off.
//!
//! The button ISR cannot animate the LED or talk HTTP, so it only raises a
//! latch.  The control loop takes the latch once per iteration and does the
//! slow work itself.
//!
//! ```text
//! ┌─────────────┐  raise()  ┌──────────────┐  take()  ┌──────────────┐
//! │ GPIO ISR    │──────────▶│  PressLatch  │─────────▶│  Main Loop   │
//! │ (debounced) │           │  (AtomicBool)│          │  (consumer)  │
//! └─────────────┘           └──────────────┘          └──────────────┘
//! ```
//!
//! The latch holds at most one press.  Presses raised while one is already
//! pending coalesce, and presses raised while a pulse is playing are thrown
//! away with [`PressLatch::discard`] once the pulse ends.

use core::sync::atomic::{AtomicBool, Ordering};

/// Single-slot, lock-free press flag.
#[derive(Debug)]
pub struct PressLatch {
    pending: AtomicBool,
}

impl Default for PressLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl PressLatch {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Mark a press as pending.  Safe to call from ISR context.
    pub fn raise(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Consume the pending press, if any.
    pub fn take(&self) -> bool {
        // load + store rather than swap: the C3 has no native atomic RMW and
        // the only concurrent writer sets `true`, so a press raised between
        // the two is at worst folded into this one.
        if self.pending.load(Ordering::Acquire) {
            self.pending.store(false, Ordering::Release);
            true
        } else {
            false
        }
    }

    /// Drop anything latched so far.  Returns whether a press was dropped.
    pub fn discard(&self) -> bool {
        self.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// Latch fed by the board button's ISR callback.
pub static PRESS_LATCH: PressLatch = PressLatch::new();

/// Button callback that forwards accepted presses into [`PRESS_LATCH`].
pub fn raise_press() {
    PRESS_LATCH.raise();
}
