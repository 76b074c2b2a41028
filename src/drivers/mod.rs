//! LED and button drivers, hardware initialisation, and the watchdog.

pub mod button;
pub mod hw_init;
pub mod pulse;
pub mod pwm_led;
pub mod watchdog;
