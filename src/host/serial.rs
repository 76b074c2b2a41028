//! `serialport` backing for [`SerialLink`].

use std::io;
use std::time::Duration;

use serialport::SerialPort;

use super::client::SerialLink;

fn to_io(e: serialport::Error) -> io::Error {
    let kind = match e.kind() {
        serialport::ErrorKind::NoDevice => io::ErrorKind::NotFound,
        serialport::ErrorKind::InvalidInput => io::ErrorKind::InvalidInput,
        serialport::ErrorKind::Io(kind) => kind,
        serialport::ErrorKind::Unknown => io::ErrorKind::Other,
    };
    io::Error::new(kind, e.description)
}

impl SerialLink for Box<dyn SerialPort> {
    fn set_dtr(&mut self, level: bool) -> io::Result<()> {
        self.write_data_terminal_ready(level).map_err(to_io)
    }

    fn set_rts(&mut self, level: bool) -> io::Result<()> {
        self.write_request_to_send(level).map_err(to_io)
    }
}

/// Open `path` at `baud` with a per-read timeout.
pub fn open(path: &str, baud: u32, timeout: Duration) -> serialport::Result<Box<dyn SerialPort>> {
    serialport::new(path, baud).timeout(timeout).open()
}

/// Port names the OS reports, for `--port` hints.
pub fn available() -> Vec<String> {
    serialport::available_ports()
        .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
        .unwrap_or_default()
}
