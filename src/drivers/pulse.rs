//! Brightness pulse engine.
//!
//! Drives a dimmable output through one "breath": a rising ramp of
//! `steps` frames followed immediately by the same frames in reverse.
//!
//! ```text
//!   duty(i) = round( sin(π·i/steps)^6 · MAX_DUTY )      i ∈ [0, steps)
//!
//!   forward:  i = 0 → steps-1      (each frame, then sleep cycle_ms/steps)
//!   backward: i = steps-1 → 0
//! ```
//!
//! The curve is `b²` with `b = sin(x·π)³`, which keeps the LED dark for a
//! long stretch at each end and gives a soft peak at the midpoint.
//!
//! [`PulseEngine::run`] blocks the caller for the whole animation.  The
//! output is forced to zero on every exit path, success or failure.

use embedded_hal::delay::DelayNs;
use embedded_hal::pwm::{Error as _, SetDutyCycle};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::PulseError;

/// Timing and resolution of one pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseProfile {
    /// Duration of each ramp half (milliseconds).
    pub cycle_ms: u32,
    /// Frames per ramp half.
    pub steps: u16,
}

impl Default for PulseProfile {
    fn default() -> Self {
        Self {
            cycle_ms: 3000,
            steps: 100,
        }
    }
}

impl PulseProfile {
    /// Sleep after each frame.
    pub fn step_ms(&self) -> u32 {
        self.cycle_ms / u32::from(self.steps.max(1))
    }

    /// Duty for frame `step` of a ramp half, scaled to `max_duty`.
    pub fn duty_at(&self, step: u16, max_duty: u16) -> u16 {
        if self.steps == 0 {
            return 0;
        }
        let x = f32::from(step) / f32::from(self.steps);
        let b = (x * core::f32::consts::PI).sin().powi(3);
        let duty = (b * b * f32::from(max_duty)).round();
        duty.clamp(0.0, f32::from(max_duty)) as u16
    }

    /// Every frame of one pulse, rising half then falling half.
    pub fn frames(&self, max_duty: u16) -> impl Iterator<Item = u16> + '_ {
        (0..self.steps)
            .chain((0..self.steps).rev())
            .map(move |i| self.duty_at(i, max_duty))
    }
}

/// Runs pulses on any [`SetDutyCycle`] output.
#[derive(Debug, Clone, Copy)]
pub struct PulseEngine {
    profile: PulseProfile,
}

impl PulseEngine {
    pub fn new(profile: PulseProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &PulseProfile {
        &self.profile
    }

    /// Play one full pulse.  Blocks for roughly `2 · cycle_ms`.
    pub fn run<O, D>(&self, out: &mut O, delay: &mut D) -> Result<(), PulseError>
    where
        O: SetDutyCycle,
        D: DelayNs,
    {
        let result = self.play(out, delay);
        if let Err(e) = out.set_duty_cycle_fully_off() {
            warn!("pulse: failed to zero output: {:?}", e);
        }
        result
    }

    fn play<O, D>(&self, out: &mut O, delay: &mut D) -> Result<(), PulseError>
    where
        O: SetDutyCycle,
        D: DelayNs,
    {
        let max_duty = out.max_duty_cycle();
        let step_ms = self.profile.step_ms();

        for (frame, duty) in self.profile.frames(max_duty).enumerate() {
            out.set_duty_cycle(duty)
                .map_err(|e| PulseError::DutyWrite {
                    step: frame as u32,
                    reason: format!("{:?}", e.kind()),
                })?;
            delay.delay_ms(step_ms);
        }
        Ok(())
    }
}
