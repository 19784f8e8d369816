//! Response handling: status check, format dispatch, materialization.
//!
//! # Design
//! The handler is the only place a raw `HttpResponse` is consumed. A non-2xx
//! status short-circuits into `RestError::HttpStatus` before any decoder runs.
//! Decoders are registered per format name and produce a generic value tree;
//! the configured `ResponseBuilder` owns the mapping onto a `Resource`.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::descriptor::MethodDescriptor;
use crate::error::RestError;
use crate::format::JSON_FORMAT;
use crate::http::HttpResponse;
use crate::resource::{Resource, ResponseBuilder, StructuralBuilder};

pub type DecodeFailure = Box<dyn std::error::Error + Send + Sync>;

/// Decodes a response body of one format into a value tree.
pub trait FormatDecoder: Send + Sync {
    fn decode(&self, body: &str) -> Result<Value, DecodeFailure>;
}

/// JSON bodies. An empty body (e.g. a 204) decodes to `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl FormatDecoder for JsonDecoder {
    fn decode(&self, body: &str) -> Result<Value, DecodeFailure> {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(body)?)
    }
}

pub trait ResponseHandler: Send + Sync {
    fn build_response(
        &self,
        format: &str,
        descriptor: &MethodDescriptor,
        response: HttpResponse,
    ) -> Result<Resource, RestError>;
}

/// Dispatches on the format name to a registered decoder.
#[derive(Clone)]
pub struct DefaultResponseHandler {
    decoders: HashMap<String, Arc<dyn FormatDecoder>>,
    builder: Arc<dyn ResponseBuilder>,
}

impl Default for DefaultResponseHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultResponseHandler {
    /// JSON decoding with the structural builder.
    pub fn new() -> Self {
        let mut handler = Self {
            decoders: HashMap::new(),
            builder: Arc::new(StructuralBuilder),
        };
        handler.register_format(JSON_FORMAT, JsonDecoder);
        handler
    }

    pub fn register_format(&mut self, format: &str, decoder: impl FormatDecoder + 'static) {
        self.decoders
            .insert(format.to_ascii_lowercase(), Arc::new(decoder));
    }

    pub fn with_format(mut self, format: &str, decoder: impl FormatDecoder + 'static) -> Self {
        self.register_format(format, decoder);
        self
    }

    pub fn set_response_builder(&mut self, builder: impl ResponseBuilder + 'static) {
        self.builder = Arc::new(builder);
    }

    pub fn with_response_builder(mut self, builder: impl ResponseBuilder + 'static) -> Self {
        self.set_response_builder(builder);
        self
    }

    pub fn supports(&self, format: &str) -> bool {
        self.decoders.contains_key(&format.to_ascii_lowercase())
    }
}

impl std::fmt::Debug for DefaultResponseHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut formats: Vec<&String> = self.decoders.keys().collect();
        formats.sort();
        f.debug_struct("DefaultResponseHandler")
            .field("formats", &formats)
            .finish_non_exhaustive()
    }
}

impl ResponseHandler for DefaultResponseHandler {
    fn build_response(
        &self,
        format: &str,
        descriptor: &MethodDescriptor,
        response: HttpResponse,
    ) -> Result<Resource, RestError> {
        if !response.is_success() {
            tracing::warn!(
                method = descriptor.method_name(),
                status = response.status,
                "remote call returned an error status"
            );
            return Err(RestError::HttpStatus {
                status: response.status,
                body: response.body,
            });
        }

        let decoder = self
            .decoders
            .get(&format.to_ascii_lowercase())
            .ok_or_else(|| RestError::UnsupportedFormat(format.to_string()))?;

        let value = match decoder.decode(&response.body) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    method = descriptor.method_name(),
                    format,
                    error = %e,
                    "response body does not decode"
                );
                return Err(RestError::Decode {
                    format: format.to_string(),
                    body: response.body,
                    message: e.to_string(),
                });
            }
        };

        self.builder.build(descriptor, value)
    }
}
