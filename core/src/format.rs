//! Declared response format of a client.
//!
//! The format name selects the decoder in the response handler; a format
//! strategy may also advertise it on the request.

use crate::error::RestError;
use crate::http::HttpRequest;

pub const JSON_FORMAT: &str = "json";

pub trait FormatStrategy: Send + Sync {
    /// Name of the format responses are decoded with.
    fn format(&self) -> &str;

    fn apply(&self, request: &mut HttpRequest) -> Result<(), RestError>;
}

/// Names the format without touching the request.
#[derive(Debug, Clone)]
pub struct DeclaredFormat {
    format: String,
}

impl DeclaredFormat {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

impl Default for DeclaredFormat {
    fn default() -> Self {
        Self::new(JSON_FORMAT)
    }
}

impl FormatStrategy for DeclaredFormat {
    fn format(&self) -> &str {
        &self.format
    }

    fn apply(&self, _request: &mut HttpRequest) -> Result<(), RestError> {
        Ok(())
    }
}

/// Names the format and sends it as `Content-type`.
///
/// Accepts a short name (`json`) or a MIME type (`application/hal+json`). The
/// header carries the MIME type; decoding always uses the short name.
#[derive(Debug, Clone)]
pub struct HeaderFormatStrategy {
    format: String,
    mime: String,
}

impl HeaderFormatStrategy {
    pub fn new(format: impl Into<String>) -> Self {
        let given = format.into();
        if given.contains('/') {
            Self {
                format: format_name(&given),
                mime: given,
            }
        } else {
            Self {
                mime: mime_type(&given),
                format: given,
            }
        }
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }
}

impl FormatStrategy for HeaderFormatStrategy {
    fn format(&self) -> &str {
        &self.format
    }

    fn apply(&self, request: &mut HttpRequest) -> Result<(), RestError> {
        request.set_header("Content-type", self.mime.as_str());
        Ok(())
    }
}

/// `json` -> `application/json`, `xml` -> `application/xml`, and so on.
pub fn mime_type(format: &str) -> String {
    format!("application/{}", format.to_ascii_lowercase())
}

/// `application/json` -> `json`, `application/hal+json; charset=utf-8` -> `json`.
pub fn format_name(mime: &str) -> String {
    let essence = mime.split(';').next().unwrap_or_default();
    let subtype = essence.rsplit('/').next().unwrap_or_default();
    let suffix = subtype.rsplit('+').next().unwrap_or_default();
    suffix.trim().to_ascii_lowercase()
}
