//! WiFi station-mode adapter.
//!
//! Implements [`WifiPort`]: the hexagonal boundary for network connectivity.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via
//!   `esp_idf_svc::wifi::BlockingWifi`.
//! - **all other targets**: an in-memory simulation for host-side tests.
//!
//! `connect` blocks until the station has an address or the driver gives
//! up.  There is no background reconnect; the host asks again.

use core::net::Ipv4Addr;

use log::{info, warn};

use crate::app::ports::WifiPort;
use crate::error::WifiError;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> Result<(), WifiError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(WifiError::InvalidSsid);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), WifiError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(WifiError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF station
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::WifiAdapter;

#[cfg(target_os = "espidf")]
mod esp {
    use super::*;

    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

    pub struct WifiAdapter {
        wifi: BlockingWifi<EspWifi<'static>>,
    }

    fn driver_err(e: esp_idf_svc::sys::EspError) -> WifiError {
        WifiError::ConnectionFailed(e.to_string())
    }

    impl WifiAdapter {
        /// Takes an already-wrapped driver; the radio stays stopped until the
        /// first `connect`.
        pub fn new(wifi: BlockingWifi<EspWifi<'static>>) -> Self {
            Self { wifi }
        }
    }

    impl WifiPort for WifiAdapter {
        fn connect(&mut self, ssid: &str, password: &str) -> Result<(), WifiError> {
            if self.is_connected() {
                info!("WiFi: already connected, ignoring connect to '{}'", ssid);
                return Ok(());
            }
            validate_ssid(ssid)?;
            validate_password(password)?;

            let auth_method = if password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            self.wifi
                .set_configuration(&Configuration::Client(ClientConfiguration {
                    ssid: ssid.try_into().map_err(|_| WifiError::InvalidSsid)?,
                    password: password.try_into().map_err(|_| WifiError::InvalidPassword)?,
                    auth_method,
                    ..Default::default()
                }))
                .map_err(driver_err)?;

            info!("WiFi: connecting to '{}'", ssid);
            if !self.wifi.is_started().map_err(driver_err)? {
                self.wifi.start().map_err(driver_err)?;
            }
            self.wifi.connect().map_err(driver_err)?;
            self.wifi.wait_netif_up().map_err(driver_err)?;

            info!("WiFi: connected, ip={:?}", self.ip_address());
            Ok(())
        }

        fn disconnect(&mut self) -> Result<(), WifiError> {
            if self.wifi.is_connected().map_err(driver_err)? {
                self.wifi.disconnect().map_err(driver_err)?;
            }
            info!("WiFi: disconnected");
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.wifi.is_connected().unwrap_or(false)
        }

        fn ip_address(&self) -> Option<Ipv4Addr> {
            if !self.is_connected() {
                return None;
            }
            match self.wifi.wifi().sta_netif().get_ip_info() {
                Ok(info) => Some(Ipv4Addr::from(info.ip.octets())),
                Err(e) => {
                    warn!("WiFi: get_ip_info failed: {}", e);
                    None
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub use sim::WifiAdapter;

#[cfg(not(target_os = "espidf"))]
mod sim {
    use super::*;

    /// In-memory station.  Any valid credentials "associate" and get a
    /// fixed private address.
    #[derive(Debug, Default)]
    pub struct WifiAdapter {
        ssid: Option<heapless::String<32>>,
        connects: u32,
    }

    pub const SIM_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 2);

    impl WifiAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn ssid(&self) -> Option<&str> {
            self.ssid.as_deref()
        }

        /// Number of real association attempts.
        pub fn connects(&self) -> u32 {
            self.connects
        }
    }

    impl WifiPort for WifiAdapter {
        fn connect(&mut self, ssid: &str, password: &str) -> Result<(), WifiError> {
            if self.ssid.is_some() {
                return Ok(());
            }
            validate_ssid(ssid)?;
            validate_password(password)?;
            self.connects += 1;
            let mut name = heapless::String::new();
            name.push_str(ssid).map_err(|()| WifiError::InvalidSsid)?;
            self.ssid = Some(name);
            info!("WiFi(sim): connected to '{}'", ssid);
            Ok(())
        }

        fn disconnect(&mut self) -> Result<(), WifiError> {
            if self.ssid.take().is_some() {
                info!("WiFi(sim): disconnected");
            } else {
                warn!("WiFi(sim): disconnect while not connected");
            }
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.ssid.is_some()
        }

        fn ip_address(&self) -> Option<Ipv4Addr> {
            self.ssid.as_ref().map(|_| SIM_ADDRESS)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
