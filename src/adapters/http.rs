//! Outbound HTTP adapter.
//!
//! Implements [`HttpPort`] on top of the ESP-IDF HTTP client
//! (`esp_idf_svc::http::client::EspHttpConnection` driven through the
//! `embedded_svc` client wrapper).  A fresh connection is opened per
//! request; the device sends at most one request per press, so keep-alive
//! buys nothing.
//!
//! Off-target there is no network stack and every request fails with
//! [`HttpError::Unavailable`].

#[cfg(target_os = "espidf")]
use log::{debug, warn};

use crate::app::ports::{HttpPort, HttpRequest};
use crate::error::HttpError;

/// Largest response body kept; the rest is dropped before parsing.
pub const MAX_BODY: usize = 4096;

pub struct HttpAdapter {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    timeout_ms: u32,
}

impl HttpAdapter {
    pub fn new(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }
}

#[cfg(target_os = "espidf")]
fn parse_method(method: &str) -> Result<embedded_svc::http::Method, HttpError> {
    use embedded_svc::http::Method;

    match method.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::Get),
        "POST" => Ok(Method::Post),
        "PUT" => Ok(Method::Put),
        "PATCH" => Ok(Method::Patch),
        "DELETE" => Ok(Method::Delete),
        "HEAD" => Ok(Method::Head),
        "OPTIONS" => Ok(Method::Options),
        _ => Err(HttpError::UnsupportedMethod(method.to_owned())),
    }
}

#[cfg(target_os = "espidf")]
fn transport<E: core::fmt::Debug>(e: E) -> HttpError {
    HttpError::Transport(format!("{e:?}"))
}

#[cfg(target_os = "espidf")]
impl HttpPort for HttpAdapter {
    fn request(&mut self, req: &HttpRequest<'_>) -> Result<String, HttpError> {
        use core::time::Duration;

        use embedded_svc::http::client::Client;
        use embedded_svc::io::{Read, Write};
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let method = parse_method(req.method)?;

        let connection = EspHttpConnection::new(&Configuration {
            timeout: Some(Duration::from_millis(u64::from(self.timeout_ms))),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })
        .map_err(transport)?;
        let mut client = Client::wrap(connection);

        let content_length = req.body.len().to_string();
        let mut headers: Vec<(&str, &str)> = req.headers.to_vec();
        headers.push(("Content-Length", &content_length));

        let mut request = client.request(method, req.url, &headers).map_err(transport)?;
        request.write_all(req.body.as_bytes()).map_err(transport)?;
        request.flush().map_err(transport)?;
        let mut response = request.submit().map_err(transport)?;

        let status = response.status();
        if !(200..300).contains(&status) {
            warn!("http: {} {} returned {}", req.method, req.url, status);
        }

        let mut body = Vec::new();
        let mut buf = [0u8; 512];
        loop {
            let n = response.read(&mut buf).map_err(transport)?;
            if n == 0 {
                break;
            }
            let room = MAX_BODY.saturating_sub(body.len());
            body.extend_from_slice(&buf[..n.min(room)]);
        }
        debug!("http: {} byte reply, status {}", body.len(), status);

        String::from_utf8(body).map_err(|e| HttpError::Transport(e.to_string()))
    }
}

#[cfg(not(target_os = "espidf"))]
impl HttpPort for HttpAdapter {
    fn request(&mut self, req: &HttpRequest<'_>) -> Result<String, HttpError> {
        log::info!("http(sim): {} {} dropped, no network stack", req.method, req.url);
        Err(HttpError::Unavailable)
    }
}
