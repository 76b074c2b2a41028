//! Task Watchdog Timer (TWDT) supervision for the control loop.
//!
//! [`Watchdog::for_config`] sizes the TWDT from [`DeviceConfig`] and checks
//! the timeout against [`DeviceConfig::longest_unfed_ms`] before the loop
//! starts.  The loop reaches the watchdog only through
//! [`WatchdogPort::feed`], which it calls between blocking steps.
//!
//! ```text
//!   boot ──▶ for_config ──▶ subscribe ──▶ feed · feed · feed ──▶ (drop: unsubscribe)
//! ```

use core::cell::Cell;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
use log::{info, warn};

use crate::app::ports::WatchdogPort;
use crate::config::DeviceConfig;

/// Whether the control task is actually supervised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    /// The calling task is on the TWDT.
    Active,
    /// ESP-IDF refused to add the task; carries the `esp_err_t`.
    Refused(i32),
    /// Host build.  Feeds are only counted.
    Simulated,
}

pub struct Watchdog {
    timeout_ms: u32,
    subscription: Subscription,
    feeds: Cell<u32>,
}

impl Watchdog {
    /// Subscribe with the configured timeout, warning when it cannot cover
    /// the longest blocking stretch of the loop.
    pub fn for_config(config: &DeviceConfig) -> Self {
        match headroom_ms(config) {
            Some(ms) => info!(
                "Watchdog: {} ms timeout, {} ms over the longest unfed stretch",
                config.watchdog_timeout_ms, ms
            ),
            None => warn!(
                "Watchdog: {} ms timeout does not cover {} ms of blocking work",
                config.watchdog_timeout_ms,
                config.longest_unfed_ms()
            ),
        }
        Self::start(config.watchdog_timeout_ms)
    }

    /// Subscribe the calling task with `timeout_ms`, panicking on expiry.
    pub fn start(timeout_ms: u32) -> Self {
        let subscription = subscribe(timeout_ms);
        match subscription {
            Subscription::Active => info!("Watchdog: task subscribed, panic on trigger"),
            Subscription::Refused(code) => warn!("Watchdog: subscribe refused ({})", code),
            Subscription::Simulated => info!("Watchdog(sim): {} ms, feeds counted only", timeout_ms),
        }
        Self {
            timeout_ms,
            subscription,
            feeds: Cell::new(0),
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn subscription(&self) -> Subscription {
        self.subscription
    }

    /// Feeds since start, wrapping.
    pub fn feeds(&self) -> u32 {
        self.feeds.get()
    }
}

impl WatchdogPort for Watchdog {
    fn feed(&self) {
        self.feeds.set(self.feeds.get().wrapping_add(1));
        #[cfg(target_os = "espidf")]
        {
            if self.subscription == Subscription::Active {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscription == Subscription::Active {
                let ret = unsafe { esp_task_wdt_delete(core::ptr::null_mut()) };
                if ret != ESP_OK as i32 {
                    warn!("Watchdog: unsubscribe returned {}", ret);
                }
            }
        }
    }
}

/// Margin between the TWDT timeout and the longest unfed stretch of the
/// loop.  `None` when the timeout does not cover it.
pub fn headroom_ms(config: &DeviceConfig) -> Option<u32> {
    config
        .watchdog_timeout_ms
        .checked_sub(config.longest_unfed_ms())
        .filter(|&ms| ms > 0)
}

#[cfg(target_os = "espidf")]
fn subscribe(timeout_ms: u32) -> Subscription {
    let cfg = esp_task_wdt_config_t {
        timeout_ms,
        idle_core_mask: 0,
        trigger_panic: true,
    };
    unsafe {
        // sdkconfig normally starts the TWDT; reconfigure only works on a
        // running one.
        let mut ret = esp_task_wdt_reconfigure(&cfg);
        if ret == ESP_ERR_INVALID_STATE as i32 {
            ret = esp_task_wdt_init(&cfg);
        }
        if ret != ESP_OK as i32 {
            warn!("Watchdog: configure returned {}, keeping previous timeout", ret);
        }

        let ret = esp_task_wdt_add(core::ptr::null_mut());
        if ret == ESP_OK as i32 {
            Subscription::Active
        } else {
            Subscription::Refused(ret)
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn subscribe(_timeout_ms: u32) -> Subscription {
    Subscription::Simulated
}
