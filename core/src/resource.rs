//! Materialized call results and the builders that produce them.
//!
//! # Design
//! A decoded body is a `serde_json::Value`; a `ResponseBuilder` turns it into a
//! `Resource`: a scalar, a collection, or an object. `StructuralBuilder` maps
//! the tree as-is. `LazyBuilder` additionally reads HAL-style `_links` and
//! `_embedded` maps and exposes them as named relations: links are fetched
//! through a `LinkFetcher` on first access, embedded values are available
//! immediately. Typed results come from `Resource::deserialize`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::descriptor::MethodDescriptor;
use crate::error::RestError;
use crate::lazy::LazyCell;

const LINKS_KEY: &str = "_links";
const EMBEDDED_KEY: &str = "_embedded";

#[derive(Debug)]
pub enum Resource {
    Scalar(Value),
    Collection(Vec<Resource>),
    Object(ResourceObject),
}

impl Resource {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Resource::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&[Resource]> {
        match self {
            Resource::Collection(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ResourceObject> {
        match self {
            Resource::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Render back to JSON. Resolved relations are inlined under their name;
    /// unresolved ones are left out rather than fetched.
    pub fn to_value(&self) -> Value {
        match self {
            Resource::Scalar(value) => value.clone(),
            Resource::Collection(items) => Value::Array(items.iter().map(Resource::to_value).collect()),
            Resource::Object(object) => object.to_value(),
        }
    }

    /// Map onto a serde type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, RestError> {
        serde_json::from_value(self.to_value()).map_err(|e| RestError::Serialization(e.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct ResourceObject {
    fields: Map<String, Value>,
    relations: BTreeMap<String, LazyCell<Resource>>,
}

impl ResourceObject {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            relations: BTreeMap::new(),
        }
    }

    pub fn with_relation(mut self, relation: LazyCell<Resource>) -> Self {
        self.relations.insert(relation.name().to_string(), relation);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn relation_names(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }

    pub fn relation_cell(&self, name: &str) -> Option<&LazyCell<Resource>> {
        self.relations.get(name)
    }

    /// The related resource, fetched on first access.
    pub fn relation(&self, name: &str) -> Result<&Resource, RestError> {
        self.relations
            .get(name)
            .ok_or_else(|| RestError::RelationFailed {
                relation: name.to_string(),
                message: "no such relation".to_string(),
            })?
            .get()
    }

    fn to_value(&self) -> Value {
        let mut fields = self.fields.clone();
        for (name, cell) in &self.relations {
            if let Some(resource) = cell.peek() {
                fields.insert(name.clone(), resource.to_value());
            }
        }
        Value::Object(fields)
    }
}

/// Turns a decoded value tree into the caller-visible result.
pub trait ResponseBuilder: Send + Sync {
    fn build(&self, descriptor: &MethodDescriptor, value: Value) -> Result<Resource, RestError>;
}

/// Fetches the resource behind a link href.
pub trait LinkFetcher: Send + Sync {
    fn fetch(&self, href: &str) -> Result<Resource, RestError>;
}

/// Direct field-by-field mapping with no relations.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralBuilder;

impl StructuralBuilder {
    fn materialize(value: Value) -> Resource {
        match value {
            Value::Array(items) => Resource::Collection(items.into_iter().map(Self::materialize).collect()),
            Value::Object(fields) => Resource::Object(ResourceObject::new(fields)),
            scalar => Resource::Scalar(scalar),
        }
    }
}

impl ResponseBuilder for StructuralBuilder {
    fn build(&self, _descriptor: &MethodDescriptor, value: Value) -> Result<Resource, RestError> {
        Ok(Self::materialize(value))
    }
}

/// Exposes `_links` as lazily fetched relations and `_embedded` as resolved
/// ones.
#[derive(Clone)]
pub struct LazyBuilder {
    fetcher: Arc<dyn LinkFetcher>,
}

impl LazyBuilder {
    pub fn new(fetcher: impl LinkFetcher + 'static) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
        }
    }

    pub fn from_arc(fetcher: Arc<dyn LinkFetcher>) -> Self {
        Self { fetcher }
    }

    fn materialize(&self, value: Value) -> Resource {
        match value {
            Value::Array(items) => {
                Resource::Collection(items.into_iter().map(|item| self.materialize(item)).collect())
            }
            Value::Object(fields) => Resource::Object(self.link(ResourceObject::new(fields))),
            scalar => Resource::Scalar(scalar),
        }
    }

    /// Lift `_links` and `_embedded` still sitting in the fields of an
    /// already built resource, such as one a link fetcher returned.
    fn relink(&self, resource: Resource) -> Resource {
        match resource {
            Resource::Collection(items) => {
                Resource::Collection(items.into_iter().map(|item| self.relink(item)).collect())
            }
            Resource::Object(object) => Resource::Object(self.link(object)),
            scalar => scalar,
        }
    }

    fn link(&self, mut object: ResourceObject) -> ResourceObject {
        let links = object.fields.remove(LINKS_KEY);
        let embedded = object.fields.remove(EMBEDDED_KEY);

        if let Some(Value::Object(links)) = links {
            for (name, link) in links {
                let Some(href) = link_href(&link) else {
                    tracing::warn!(relation = %name, "ignoring link without href");
                    continue;
                };
                let builder = self.clone();
                object = object.with_relation(LazyCell::new(name, move || {
                    builder.fetcher.fetch(&href).map(|resource| builder.relink(resource))
                }));
            }
        }
        if let Some(Value::Object(embedded)) = embedded {
            for (name, value) in embedded {
                let resource = self.materialize(value);
                object = object.with_relation(LazyCell::resolved(name, resource));
            }
        }
        object
    }
}

impl std::fmt::Debug for LazyBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyBuilder").finish_non_exhaustive()
    }
}

impl ResponseBuilder for LazyBuilder {
    fn build(&self, _descriptor: &MethodDescriptor, value: Value) -> Result<Resource, RestError> {
        Ok(self.materialize(value))
    }
}

/// `{"href": "/x"}` or a bare `"/x"`.
fn link_href(link: &Value) -> Option<String> {
    match link {
        Value::String(href) => Some(href.clone()),
        Value::Object(fields) => fields.get("href")?.as_str().map(str::to_string),
        _ => None,
    }
}
