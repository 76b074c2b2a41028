//! PulseLink firmware entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  PwmLed        SystemDelay    WifiAdapter    HttpAdapter     │
//! │  (SetDuty)     (DelayNs)      (WifiPort)     (HttpPort)      │
//! │  UartTransport LogEventSink                                  │
//! │  (Transport)   (EventSink)                                   │
//! │                                                              │
//! │  ─────────────────── Port Trait Boundary ──────────────────  │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │            DeviceService (pure logic)                  │  │
//! │  │  commands · request template · pulse engine            │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  Button ISR ──▶ PressLatch ──▶ poll_once · Watchdog          │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{Context, Result, anyhow};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::AnyIOPin;
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{info, warn};

use pulselink::adapters::http::HttpAdapter;
use pulselink::adapters::log_sink::LogEventSink;
use pulselink::adapters::serial::UartTransport;
use pulselink::adapters::time::SystemDelay;
use pulselink::adapters::wifi::WifiAdapter;
use pulselink::app::DeviceService;
use pulselink::config::DeviceConfig;
use pulselink::drivers::button::BUTTON;
use pulselink::drivers::hw_init;
use pulselink::drivers::pwm_led::PwmLed;
use pulselink::drivers::watchdog::Watchdog;
use pulselink::events::{self, PRESS_LATCH};
use pulselink::link::LineChannel;
use pulselink::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("PulseLink v{}", env!("CARGO_PKG_VERSION"));

    let config = DeviceConfig::default();
    match serde_json::to_string(&config) {
        Ok(json) => info!("Config: {}", json),
        Err(e) => warn!("Config not printable: {}", e),
    }

    // ── 2. GPIO, LEDC and the button ISR ──────────────────────
    hw_init::init_peripherals(config.led_pwm_freq_hz).context("peripheral init")?;
    BUTTON.set_window_ms(config.debounce_ms);
    BUTTON
        .set_on_press(events::raise_press)
        .map_err(|e| anyhow!("{e}"))?;
    hw_init::init_isr_service().context("button ISR")?;
    info!("Button on GPIO{} ({} ms debounce)", BUTTON.gpio(), BUTTON.window_ms());

    // ── 3. Console UART and radio ─────────────────────────────
    let peripherals = Peripherals::take()?;
    let uart = UartDriver::new(
        peripherals.uart0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio20,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(Hertz(config.serial_baud)),
    )
    .context("console UART")?;
    info!(
        "Console UART: TX GPIO{} / RX GPIO{} @ {} baud",
        pins::UART_TX_GPIO,
        pins::UART_RX_GPIO,
        config.serial_baud
    );
    let mut link = LineChannel::new(UartTransport::new(uart));

    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;

    // ── 4. Service ────────────────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut service = DeviceService::new(
        PwmLed::new(),
        SystemDelay,
        WifiAdapter::new(wifi),
        HttpAdapter::new(config.http_timeout_ms),
        config.clone(),
    );
    service.set_value_provider(Box::new(|| BUTTON.press_count().to_string()));

    let watchdog = Watchdog::for_config(&config);
    service.start(&mut sink);

    info!("System ready. Entering control loop.");

    // ── 5. Control loop ───────────────────────────────────────
    loop {
        service.poll_once(&mut link, &PRESS_LATCH, &watchdog, &mut sink);
        service.idle();
    }
}
