//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                 |
//! |------------|--------------|-----------------------------|
//! | `wifi`     | WifiPort     | ESP-IDF WiFi STA / sim      |
//! | `http`     | HttpPort     | ESP-IDF HTTP client / sim   |
//! | `serial`   | Transport    | Console UART (device only)  |
//! | `time`     | DelayNs      | FreeRTOS delay, esp_timer   |
//! | `log_sink` | EventSink    | Serial log output           |

pub mod http;
pub mod log_sink;
#[cfg(target_os = "espidf")]
pub mod serial;
pub mod time;
pub mod wifi;
