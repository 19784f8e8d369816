//! Request body construction for POST and PUT calls.

use serde_json::Value;

use crate::descriptor::MethodDescriptor;
use crate::error::RestError;

/// The resolved parameter set of one call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceBinder {
    params: Vec<Value>,
}

impl ResourceBinder {
    pub fn new(params: Vec<Value>) -> Self {
        Self { params }
    }

    pub fn from_descriptor(descriptor: &MethodDescriptor) -> Self {
        Self::new(descriptor.params().to_vec())
    }

    /// Positional parameters as passed to the call.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// The parameter mapping sent as a body: a lone object parameter as-is,
    /// no parameters as `{}`, anything else as the positional list.
    pub fn payload(&self) -> Value {
        match self.params.as_slice() {
            [] => Value::Object(serde_json::Map::new()),
            [single @ Value::Object(_)] => single.clone(),
            params => Value::Array(params.to_vec()),
        }
    }
}

/// What an `ArgumentBuilder` sees of the current call.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    binder: &'a ResourceBinder,
}

impl<'a> Context<'a> {
    pub fn new(binder: &'a ResourceBinder) -> Self {
        Self { binder }
    }

    pub fn resource_binder(&self) -> &'a ResourceBinder {
        self.binder
    }
}

/// Serializes the call parameters into a request body.
pub trait ArgumentBuilder: Send + Sync {
    fn build(&self, context: &Context<'_>) -> Result<String, RestError>;

    /// Value for the `content-type` header sent with the body.
    fn content_type(&self) -> &str;
}

/// Encodes the binder payload as compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonArgumentBuilder;

impl ArgumentBuilder for JsonArgumentBuilder {
    fn build(&self, context: &Context<'_>) -> Result<String, RestError> {
        let payload = context.resource_binder().payload();
        serde_json::to_string(&payload).map_err(|e| RestError::Serialization(e.to_string()))
    }

    fn content_type(&self) -> &str {
        "application/json"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn build(params: Vec<Value>) -> String {
        let binder = ResourceBinder::new(params);
        JsonArgumentBuilder.build(&Context::new(&binder)).unwrap()
    }

    #[test]
    fn single_object_is_sent_as_is() {
        assert_eq!(build(vec![json!({"name": "Dave"})]), r#"{"name":"Dave"}"#);
    }

    #[test]
    fn no_params_is_empty_object() {
        assert_eq!(build(vec![]), "{}");
    }

    #[test]
    fn several_params_are_a_list() {
        assert_eq!(build(vec![json!(1), json!({"name": "Eve"})]), r#"[1,{"name":"Eve"}]"#);
    }

    #[test]
    fn lone_scalar_is_a_list() {
        assert_eq!(build(vec![json!("x")]), r#"["x"]"#);
    }

    #[test]
    fn output_is_deterministic() {
        let params = vec![json!({"b": 2, "a": 1, "c": [1, 2]})];
        assert_eq!(build(params.clone()), build(params));
    }

    #[test]
    fn json_content_type() {
        assert_eq!(JsonArgumentBuilder.content_type(), "application/json");
    }
}
