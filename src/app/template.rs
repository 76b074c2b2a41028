//! Request template client.
//!
//! Holds the outbound HTTP target (URL + method) and a body template with a
//! single `$$` marker.  On send, the marker is replaced with whatever the
//! value provider returns at that moment and the JSON reply is parsed.
//!
//! ```text
//! template:  {"presses":$$}
//! provider:  || BUTTON.press_count().to_string()
//! body:      {"presses":7}
//! ```

use core::fmt;

use log::{debug, info};
use serde_json::{Value, json};

use crate::error::TemplateError;

use super::ports::{HttpPort, HttpRequest};

/// Substitution marker.
pub const MARKER: &str = "$$";

/// Headers sent with every request.
pub const JSON_HEADERS: [(&str, &str); 1] = [("Content-Type", "application/json")];

/// Source of the value substituted for [`MARKER`].
pub type ValueProvider = Box<dyn FnMut() -> String>;

#[derive(Default)]
pub struct RequestTemplate {
    url: Option<String>,
    method: Option<String>,
    data_template: Option<String>,
    provider: Option<ValueProvider>,
}

impl fmt::Debug for RequestTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestTemplate")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("data_template", &self.data_template)
            .field("provider", &self.provider.is_some())
            .finish()
    }
}

impl RequestTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` clears the URL.
    pub fn set_url(&mut self, url: Option<String>) {
        self.url = url;
    }

    /// `None` clears the method.
    pub fn set_method(&mut self, method: Option<String>) {
        self.method = method;
    }

    /// Store a body template.  Rejected templates leave the stored one
    /// untouched.
    pub fn set_data_template(&mut self, template: Option<String>) -> Result<(), TemplateError> {
        let template = template.ok_or(TemplateError::TemplateRequired)?;
        match template.matches(MARKER).count() {
            0 => Err(TemplateError::MissingMarker),
            1 => {
                self.data_template = Some(template);
                Ok(())
            }
            _ => Err(TemplateError::RepeatedMarker),
        }
    }

    pub fn set_value_provider(&mut self, provider: ValueProvider) {
        self.provider = Some(provider);
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn data_template(&self) -> Option<&str> {
        self.data_template.as_deref()
    }

    /// Substitute the provider's current value into the template.
    pub fn render(&mut self) -> Result<String, TemplateError> {
        let (Some(template), Some(provider)) = (&self.data_template, &mut self.provider) else {
            return Err(TemplateError::RenderUnavailable);
        };
        Ok(template.replacen(MARKER, &provider(), 1))
    }

    /// Render, send, and parse the JSON reply.
    ///
    /// Nothing goes on the wire unless the body renders: a missing template
    /// or provider is [`TemplateError::RenderUnavailable`].
    pub fn send(&mut self, http: &mut impl HttpPort) -> Result<Value, TemplateError> {
        if self.url.is_none() || self.method.is_none() {
            return Err(TemplateError::TargetUnset);
        }
        let body = self.render()?;

        let (Some(url), Some(method)) = (self.url.as_deref(), self.method.as_deref()) else {
            return Err(TemplateError::TargetUnset);
        };
        info!("http: {} {} ({} byte body)", method, url, body.len());

        let text = http.request(&HttpRequest {
            method,
            url,
            body: &body,
            headers: &JSON_HEADERS,
        })?;
        debug!("http: reply {:?}", text);

        serde_json::from_str(&text).map_err(|e| TemplateError::InvalidResponse(e.to_string()))
    }

    /// Current configuration, template unrendered, `null` for unset fields.
    pub fn dump(&self) -> Value {
        json!({
            "url": self.url,
            "method": self.method,
            "data_template": self.data_template,
        })
    }
}
