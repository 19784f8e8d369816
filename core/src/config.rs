//! Serializable client configuration.
//!
//! # Design
//! Everything a client needs besides code (strategies, transport) fits in
//! a `ClientConfig`: where the API lives, how responses are encoded, and the
//! method mapping table. Routes are validated when the mapping is built, not
//! when the config is deserialized, so a bad route surfaces as
//! `RestError::InvalidRoute` rather than a serde error.

use serde::{Deserialize, Serialize};

use crate::error::RestError;
use crate::format::JSON_FORMAT;
use crate::mapping::{MethodMapping, Route};

fn default_format() -> String {
    JSON_FORMAT.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_uri: String,
    #[serde(default = "default_format")]
    pub format: String,
    /// Resource used by bare verb names such as `get` or `create`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,
}

impl ClientConfig {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            format: default_format(),
            resource: None,
            routes: Vec::new(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, RestError> {
        serde_json::from_str(raw).map_err(|e| RestError::Serialization(e.to_string()))
    }

    pub fn mapping(&self) -> Result<MethodMapping, RestError> {
        let mapping = match &self.resource {
            Some(resource) => MethodMapping::new(resource),
            None => MethodMapping::default(),
        };
        mapping.with_routes(self.routes.iter().cloned())
    }
}
