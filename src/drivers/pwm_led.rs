//! Dimmable LED on one LEDC channel.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes the LEDC duty register via hw_init.
//! On host/test: tracks the duty in-memory only.

use embedded_hal::pwm::{ErrorKind, ErrorType, SetDutyCycle};

use crate::drivers::hw_init;
use crate::pins;

/// LEDC register write failed with the given ESP-IDF error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedcError(pub i32);

impl embedded_hal::pwm::Error for LedcError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

pub struct PwmLed {
    channel: u32,
    duty: u16,
}

impl Default for PwmLed {
    fn default() -> Self {
        Self::new()
    }
}

impl PwmLed {
    pub fn new() -> Self {
        Self {
            channel: hw_init::LEDC_CH_LED,
            duty: 0,
        }
    }

    /// Last duty successfully written.
    pub fn duty(&self) -> u16 {
        self.duty
    }
}

impl ErrorType for PwmLed {
    type Error = LedcError;
}

impl SetDutyCycle for PwmLed {
    fn max_duty_cycle(&self) -> u16 {
        pins::PWM_MAX_DUTY
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), LedcError> {
        let duty = duty.min(pins::PWM_MAX_DUTY);
        hw_init::ledc_set(self.channel, u32::from(duty)).map_err(LedcError)?;
        self.duty = duty;
        Ok(())
    }
}
