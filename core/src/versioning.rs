//! API versioning hook applied to every outgoing request.

use crate::error::RestError;
use crate::http::HttpRequest;

pub trait VersioningStrategy: Send + Sync {
    fn version(&self, request: &mut HttpRequest) -> Result<(), RestError>;
}

/// Sends the version as a header, `Rest-Version` unless renamed.
#[derive(Debug, Clone)]
pub struct HeaderVersioningStrategy {
    version: String,
    header: String,
}

impl HeaderVersioningStrategy {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            header: "Rest-Version".to_string(),
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }
}

impl VersioningStrategy for HeaderVersioningStrategy {
    fn version(&self, request: &mut HttpRequest) -> Result<(), RestError> {
        request.set_header(self.header.as_str(), self.version.as_str());
        Ok(())
    }
}

/// Sends the version as a `version=` query parameter.
#[derive(Debug, Clone)]
pub struct QueryVersioningStrategy {
    version: String,
}

impl QueryVersioningStrategy {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl VersioningStrategy for QueryVersioningStrategy {
    fn version(&self, request: &mut HttpRequest) -> Result<(), RestError> {
        request.append_query("version", &self.version);
        Ok(())
    }
}
