//! Device service: the hexagonal core.
//!
//! [`DeviceService`] owns the LED, the step delay, the network ports, the
//! request template and the logical device state.  One loop iteration
//! ([`DeviceService::poll_once`]) does, in order:
//!
//! 1. service a latched button press (pulse, then request)
//! 2. read at most one command line and write exactly one response
//! 3. emit one heartbeat while the running flag is set
//!
//! The watchdog is fed after every step that can block: the press pulse,
//! the press request and the line step.
//!
//! ```text
//!  PressLatch ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │      DeviceService       │
//!  LineChannel ◀─▶│ template · pulse · state │ ──▶ SetDutyCycle / HttpPort
//!                 └──────────────────────────┘
//! ```
//!
//! A pulse blocks the whole iteration.  Presses that arrive meanwhile are
//! discarded as soon as the pulse ends, never queued.  Presses that arrive
//! during anything else stay latched for the next iteration.

use embedded_hal::delay::DelayNs;
use embedded_hal::pwm::{Error as _, SetDutyCycle};
use log::{debug, info, warn};

use crate::config::DeviceConfig;
use crate::drivers::pulse::PulseEngine;
use crate::error::{ProtocolError, PulseError};
use crate::events::PressLatch;
use crate::link::{LineChannel, Transport};

use super::commands::Command;
use super::events::AppEvent;
use super::ports::{EventSink, HttpPort, WatchdogPort, WifiPort};
use super::responses::{HEARTBEAT_LINE, Response};
use super::template::{RequestTemplate, ValueProvider};

/// Reply for command names this firmware does not handle.
pub const INVALID_COMMAND: &str = "Invalid command";

const WIFI_CONNECTED: &str = "WiFi connected";
const WIFI_FAILED: &str = "Failed to connect to WiFi";
const NO_ADDRESS: &str = "0.0.0.0";

/// Logical device state.  Single writer: the control loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceState {
    /// Set by the `led` toggle, cleared by every pulse.
    pub led_on: bool,
    /// Last duty written to the LED.
    pub duty: u16,
}

pub struct DeviceService<L, D, W, H> {
    led: L,
    delay: D,
    wifi: W,
    http: H,
    state: DeviceState,
    template: RequestTemplate,
    pulse: PulseEngine,
    config: DeviceConfig,
    running: bool,
    pulses: u32,
    presses_handled: u32,
}

impl<L, D, W, H> DeviceService<L, D, W, H>
where
    L: SetDutyCycle,
    D: DelayNs,
    W: WifiPort,
    H: HttpPort,
{
    /// Construct the service.  The LED starts dark and no template is set.
    pub fn new(mut led: L, delay: D, wifi: W, http: H, config: DeviceConfig) -> Self {
        if let Err(e) = led.set_duty_cycle_fully_off() {
            warn!("service: could not zero LED at start: {:?}", e.kind());
        }
        Self {
            led,
            delay,
            wifi,
            http,
            state: DeviceState::default(),
            template: RequestTemplate::new(),
            pulse: PulseEngine::new(config.pulse),
            running: config.heartbeat,
            config,
            pulses: 0,
            presses_handled: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started {
            heartbeat: self.running,
        });
        info!(
            "DeviceService started (heartbeat={}, loop={}ms)",
            self.running, self.config.loop_interval_ms
        );
    }

    /// Wire the value substituted into the request template.
    pub fn set_value_provider(&mut self, provider: ValueProvider) {
        self.template.set_value_provider(provider);
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one loop iteration.
    pub fn poll_once<T: Transport>(
        &mut self,
        link: &mut LineChannel<T>,
        latch: &PressLatch,
        watchdog: &impl WatchdogPort,
        sink: &mut impl EventSink,
    ) {
        if latch.take() {
            self.on_button_press(latch, watchdog, sink);
        }

        let pulses_before = self.pulses;
        match link.poll_line() {
            Ok(Some(line)) => {
                if let Some(resp) = self.handle_line(&line, sink) {
                    if let Err(e) = link.send_line(&resp.to_line()) {
                        sink.emit(&AppEvent::LinkFault(format!("write: {e:?}")));
                    }
                }
            }
            Ok(None) => {}
            Err(e) => sink.emit(&AppEvent::LinkFault(format!("read: {e:?}"))),
        }

        if self.pulses != pulses_before {
            Self::drop_latched_press(latch, sink);
        }
        watchdog.feed();

        if self.running {
            if let Err(e) = link.send_line(HEARTBEAT_LINE) {
                sink.emit(&AppEvent::LinkFault(format!("heartbeat: {e:?}")));
            }
        }
    }

    /// Sleep for the loop cadence.
    pub fn idle(&mut self) {
        self.delay.delay_ms(self.config.loop_interval_ms);
    }

    /// Loop forever.
    pub fn run<T: Transport>(
        &mut self,
        link: &mut LineChannel<T>,
        latch: &PressLatch,
        watchdog: &impl WatchdogPort,
        sink: &mut impl EventSink,
    ) -> ! {
        loop {
            self.poll_once(link, latch, watchdog, sink);
            self.idle();
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Parse and dispatch one line.  `None` means the line gets no reply.
    pub fn handle_line(&mut self, line: &str, sink: &mut impl EventSink) -> Option<Response> {
        match Command::parse_line(line) {
            Ok(cmd) => Some(self.handle_command(cmd)),
            Err(ProtocolError::BadField(msg)) => Some(Response::Error(msg)),
            Err(e) => {
                debug!("service: ignoring line {:?}: {}", line, e);
                sink.emit(&AppEvent::LineIgnored(e));
                None
            }
        }
    }

    /// Dispatch one command.  Every variant produces exactly one response.
    pub fn handle_command(&mut self, cmd: Command) -> Response {
        debug!("service: {}", cmd.name());
        match cmd {
            Command::Led => self.toggle_led(),
            Command::CheckWifi => Response::val(self.wifi.is_connected()),
            Command::ConnectWifi { ssid, password } => {
                let Some(ssid) = ssid else {
                    return Response::val(WIFI_FAILED);
                };
                match self.wifi.connect(&ssid, password.as_deref().unwrap_or("")) {
                    Ok(()) => Response::val(WIFI_CONNECTED),
                    Err(e) => {
                        warn!("service: WiFi connect to '{}' failed: {}", ssid, e);
                        Response::val(WIFI_FAILED)
                    }
                }
            }
            Command::DisconnectWifi => match self.wifi.disconnect() {
                Ok(()) => Response::val("WiFi disconnected"),
                Err(e) => Response::error(e),
            },
            Command::GetIp => Response::val(
                self.wifi
                    .ip_address()
                    .map_or_else(|| NO_ADDRESS.to_owned(), |ip| ip.to_string()),
            ),
            Command::Pulse => match self.pulse() {
                Ok(()) => Response::val("ok"),
                Err(e) => Response::error(e),
            },
            Command::SetUrl { url } => {
                self.template.set_url(url);
                Response::val("URL set")
            }
            Command::SetMethod { method } => {
                self.template.set_method(method);
                Response::val("Method set")
            }
            Command::SetDataTemplate { data_template } => {
                match self.template.set_data_template(data_template) {
                    Ok(()) => Response::val("Data template set"),
                    Err(e) => Response::error(e),
                }
            }
            Command::SendRequest => match self.template.send(&mut self.http) {
                Ok(body) => Response::Val(body),
                Err(e) => Response::error(e),
            },
            Command::DumpHttp => Response::Val(self.template.dump()),
            Command::Unknown => Response::val(INVALID_COMMAND),
        }
    }

    /// Pulse, then fire the request.  Outcomes are reported, not returned.
    ///
    /// Presses latched during the pulse are dropped before the request goes
    /// out; presses latched during the request are left for the next
    /// iteration.
    pub fn on_button_press(
        &mut self,
        latch: &PressLatch,
        watchdog: &impl WatchdogPort,
        sink: &mut impl EventSink,
    ) {
        self.presses_handled = self.presses_handled.wrapping_add(1);
        let pulse = self.pulse();
        Self::drop_latched_press(latch, sink);
        watchdog.feed();

        let request = self.template.send(&mut self.http);
        watchdog.feed();

        sink.emit(&AppEvent::PressHandled {
            presses: self.presses_handled,
            pulse,
            request,
        });
    }

    fn drop_latched_press(latch: &PressLatch, sink: &mut impl EventSink) {
        if latch.discard() {
            sink.emit(&AppEvent::PressDropped);
        }
    }

    /// Play one pulse.  The LED is dark and logically off afterwards,
    /// whatever the outcome.
    pub fn pulse(&mut self) -> Result<(), PulseError> {
        let result = self.pulse.run(&mut self.led, &mut self.delay);
        self.pulses = self.pulses.wrapping_add(1);
        self.state = DeviceState {
            led_on: false,
            duty: 0,
        };
        result
    }

    fn toggle_led(&mut self) -> Response {
        let on = !self.state.led_on;
        let written = if on {
            self.led.set_duty_cycle_fully_on()
        } else {
            self.led.set_duty_cycle_fully_off()
        };
        match written {
            Ok(()) => {
                self.state.led_on = on;
                self.state.duty = if on { self.led.max_duty_cycle() } else { 0 };
                Response::val("LED toggled")
            }
            Err(e) => Response::error(format!("LED write failed: {:?}", e.kind())),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn template(&self) -> &RequestTemplate {
        &self.template
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Pulses played since start, press- or command-initiated.
    pub fn pulse_count(&self) -> u32 {
        self.pulses
    }

    pub fn led(&self) -> &L {
        &self.led
    }

    pub fn led_mut(&mut self) -> &mut L {
        &mut self.led
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    pub fn wifi(&self) -> &W {
        &self.wifi
    }

    pub fn wifi_mut(&mut self) -> &mut W {
        &mut self.wifi
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    pub fn http_mut(&mut self) -> &mut H {
        &mut self.http
    }
}
