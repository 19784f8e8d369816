//! Resolved (verb, resource path) pair for one call.
//!
//! # Design
//! A `MethodDescriptor` is a pure function of the mapping, the method name and
//! the parameters. For GET and DELETE the parameters end up in the URL:
//! template placeholders first, then every remaining scalar as a path segment
//! and every remaining object as query pairs. For POST and PUT the URL is the
//! bare template and the parameters are left for the argument builder.

use serde_json::Value;

use crate::error::RestError;
use crate::http::{encode_component, HttpMethod};
use crate::mapping::{parse_template, MethodMapping, TemplatePart};

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    method_name: String,
    http_method: HttpMethod,
    api_resource: String,
    params: Vec<Value>,
}

impl MethodDescriptor {
    pub fn new(
        method_name: &str,
        params: &[Value],
        mapping: &MethodMapping,
    ) -> Result<Self, RestError> {
        let resolution = mapping.resolve(method_name)?;
        let parts = parse_template(method_name, &resolution.template)?;

        let mut path = String::new();
        let mut remaining = params.iter();
        for part in parts {
            match part {
                TemplatePart::Literal(text) => path.push_str(text),
                TemplatePart::Placeholder(name) => {
                    let param = remaining.next().ok_or_else(|| {
                        unsupported(method_name, format!("no parameter for placeholder `{name}`"))
                    })?;
                    let value = lookup_field(param, name).ok_or_else(|| {
                        unsupported(method_name, format!("placeholder `{name}` has no scalar value"))
                    })?;
                    let rendered = render(value);
                    if rendered.is_empty() {
                        return Err(unsupported(method_name, format!("placeholder `{name}` is empty")));
                    }
                    path.push_str(&encode_component(&rendered));
                }
            }
        }

        if !resolution.http.has_body() {
            // A template may carry its own query; segments go in front of it.
            let mut query = match path.find('?') {
                Some(start) => path.split_off(start),
                None => String::new(),
            };
            for param in remaining {
                match param {
                    Value::Null => {}
                    Value::Object(fields) => {
                        for (key, value) in fields.iter().filter(|(_, value)| !value.is_null()) {
                            query.push(if query.is_empty() { '?' } else { '&' });
                            query.push_str(&encode_component(key));
                            query.push('=');
                            query.push_str(&encode_component(&render(value)));
                        }
                    }
                    Value::Array(items) => {
                        let joined: Vec<String> = items.iter().map(render).collect();
                        push_segment(&mut path, &joined.join(","));
                    }
                    Value::String(text) if text.is_empty() => {
                        return Err(unsupported(method_name, "empty string parameter".to_string()));
                    }
                    scalar => push_segment(&mut path, &render(scalar)),
                }
            }
            path.push_str(&query);
        }

        tracing::debug!(
            method = method_name,
            http = %resolution.http,
            resource = %path,
            "resolved method descriptor"
        );

        Ok(Self {
            method_name: method_name.to_string(),
            http_method: resolution.http,
            api_resource: path,
            params: params.to_vec(),
        })
    }

    /// Descriptor for following a link href with GET.
    pub fn follow(href: &str) -> Self {
        Self {
            method_name: "follow".to_string(),
            http_method: HttpMethod::Get,
            api_resource: href.to_string(),
            params: Vec::new(),
        }
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn http_method(&self) -> HttpMethod {
        self.http_method
    }

    /// URL path (and, for GET/DELETE, query) relative to the base URI.
    pub fn api_resource(&self) -> &str {
        &self.api_resource
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

fn unsupported(method: &str, reason: String) -> RestError {
    RestError::UnsupportedMethod {
        method: method.to_string(),
        reason,
    }
}

/// `id` selects the parameter itself; `location.id` selects field `id` of the
/// parameter. Only scalars qualify.
fn lookup_field<'a>(param: &'a Value, placeholder: &str) -> Option<&'a Value> {
    let value = placeholder
        .split('.')
        .skip(1)
        .try_fold(param, |value, field| value.get(field))?;
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Some(value),
        _ => None,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn push_segment(path: &mut String, segment: &str) {
    if !path.ends_with('/') {
        path.push('/');
    }
    path.push_str(&encode_component(segment));
}
