//! Optional request features, applied in registration order.

use crate::error::RestError;
use crate::http::HttpRequest;

pub trait Feature: Send + Sync {
    fn apply(&self, request: &mut HttpRequest) -> Result<(), RestError>;
}

/// Appends `t=<unix seconds>`, typically to defeat intermediary caches.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampFeature;

impl Feature for TimestampFeature {
    fn apply(&self, request: &mut HttpRequest) -> Result<(), RestError> {
        let now = chrono::Utc::now().timestamp();
        request.append_query("t", &now.to_string());
        Ok(())
    }
}

/// Sets a fixed header on every request.
#[derive(Debug, Clone)]
pub struct HeaderFeature {
    name: String,
    value: String,
}

impl HeaderFeature {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Feature for HeaderFeature {
    fn apply(&self, request: &mut HttpRequest) -> Result<(), RestError> {
        request.set_header(self.name.as_str(), self.value.as_str());
        Ok(())
    }
}
