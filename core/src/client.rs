//! Remote-call client: method name + arguments in, materialized resource out.
//!
//! # Design
//! `RestClient` holds configuration only; nothing from one call survives into
//! the next. A call has two halves: `build_request` produces a fully decorated `HttpRequest`
//! (descriptor, body, authentication, versioning, features, format), and
//! `parse_response` consumes the `HttpResponse`. `call` glues the two around
//! exactly one `Transport::send`, so callers that want to do their own I/O can
//! still use the two halves directly.
//!
//! Every strategy is an `Arc`, which makes the client cheap to clone. A clone
//! is a snapshot of the configuration, which is what lazy relations use to
//! fetch links later.

use std::sync::{Arc, OnceLock};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::argument::{ArgumentBuilder, Context, JsonArgumentBuilder, ResourceBinder};
use crate::auth::AuthenticationStrategy;
use crate::config::ClientConfig;
use crate::descriptor::MethodDescriptor;
use crate::error::RestError;
use crate::feature::Feature;
use crate::format::{DeclaredFormat, FormatStrategy};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::mapping::MethodMapping;
use crate::resource::{LinkFetcher, Resource};
use crate::response::{DefaultResponseHandler, ResponseHandler};
use crate::transport::{Transport, UreqTransport};
use crate::versioning::VersioningStrategy;

/// The contract a proxy layer or hand-written service facade targets.
pub trait RemoteCall {
    fn call(&self, method: &str, params: &[Value]) -> Result<Resource, RestError>;

    fn call_typed<T: DeserializeOwned>(&self, method: &str, params: &[Value]) -> Result<T, RestError>
    where
        Self: Sized,
    {
        self.call(method, params)?.deserialize()
    }
}

#[derive(Clone)]
pub struct RestClient {
    base_uri: String,
    mapping: Arc<MethodMapping>,
    format: Arc<dyn FormatStrategy>,
    argument_builder: Arc<dyn ArgumentBuilder>,
    authentication: Option<Arc<dyn AuthenticationStrategy>>,
    versioning: Option<Arc<dyn VersioningStrategy>>,
    features: Vec<Arc<dyn Feature>>,
    transport: OnceLock<Arc<dyn Transport>>,
    response_handler: OnceLock<Arc<dyn ResponseHandler>>,
}

impl RestClient {
    /// JSON client with the default method mapping and no default resource.
    pub fn new(base_uri: &str) -> Self {
        Self {
            base_uri: base_uri.trim_end_matches('/').to_string(),
            mapping: Arc::new(MethodMapping::default()),
            format: Arc::new(DeclaredFormat::default()),
            argument_builder: Arc::new(JsonArgumentBuilder),
            authentication: None,
            versioning: None,
            features: Vec::new(),
            transport: OnceLock::new(),
            response_handler: OnceLock::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, RestError> {
        let mut client = Self::new(&config.base_uri);
        client
            .set_method_mapping(config.mapping()?)
            .set_format_strategy(DeclaredFormat::new(config.format.as_str()));
        Ok(client)
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Name of the format responses are decoded with.
    pub fn format(&self) -> &str {
        self.format.format()
    }

    pub fn method_mapping(&self) -> &MethodMapping {
        &self.mapping
    }

    pub fn set_method_mapping(&mut self, mapping: MethodMapping) -> &mut Self {
        self.mapping = Arc::new(mapping);
        self
    }

    pub fn set_format_strategy(&mut self, format: impl FormatStrategy + 'static) -> &mut Self {
        self.format = Arc::new(format);
        self
    }

    pub fn set_argument_builder(&mut self, builder: impl ArgumentBuilder + 'static) -> &mut Self {
        self.argument_builder = Arc::new(builder);
        self
    }

    pub fn authentication_strategy(&self) -> Option<&Arc<dyn AuthenticationStrategy>> {
        self.authentication.as_ref()
    }

    pub fn set_authentication_strategy(
        &mut self,
        strategy: impl AuthenticationStrategy + 'static,
    ) -> &mut Self {
        self.authentication = Some(Arc::new(strategy));
        self
    }

    pub fn versioning_strategy(&self) -> Option<&Arc<dyn VersioningStrategy>> {
        self.versioning.as_ref()
    }

    pub fn set_versioning_strategy(
        &mut self,
        strategy: impl VersioningStrategy + 'static,
    ) -> &mut Self {
        self.versioning = Some(Arc::new(strategy));
        self
    }

    /// Features run in the order they were added.
    pub fn add_feature(&mut self, feature: impl Feature + 'static) -> &mut Self {
        self.features.push(Arc::new(feature));
        self
    }

    pub fn features(&self) -> &[Arc<dyn Feature>] {
        &self.features
    }

    /// The transport, created on first use if none was set.
    pub fn http_client(&self) -> Arc<dyn Transport> {
        self.transport
            .get_or_init(|| Arc::new(UreqTransport::new()) as Arc<dyn Transport>)
            .clone()
    }

    pub fn set_http_client(&mut self, transport: impl Transport + 'static) -> &mut Self {
        self.transport = OnceLock::from(Arc::new(transport) as Arc<dyn Transport>);
        self
    }

    /// The response handler, created on first use if none was set.
    pub fn response_handler(&self) -> Arc<dyn ResponseHandler> {
        self.response_handler
            .get_or_init(|| Arc::new(DefaultResponseHandler::new()) as Arc<dyn ResponseHandler>)
            .clone()
    }

    pub fn set_response_handler(&mut self, handler: impl ResponseHandler + 'static) -> &mut Self {
        self.response_handler = OnceLock::from(Arc::new(handler) as Arc<dyn ResponseHandler>);
        self
    }

    /// Perform one remote call.
    pub fn call(&self, method: &str, params: &[Value]) -> Result<Resource, RestError> {
        let (descriptor, request) = self.build_request(method, params)?;
        let response = self.send(&request)?;
        self.parse_response(&descriptor, response)
    }

    /// Perform one remote call and map the result onto `T`.
    pub fn call_typed<T: DeserializeOwned>(&self, method: &str, params: &[Value]) -> Result<T, RestError> {
        self.call(method, params)?.deserialize()
    }

    /// Resolve the descriptor and build the fully decorated request without
    /// sending it. Any strategy failure aborts here.
    pub fn build_request(
        &self,
        method: &str,
        params: &[Value],
    ) -> Result<(MethodDescriptor, HttpRequest), RestError> {
        let descriptor = MethodDescriptor::new(method, params, &self.mapping)?;
        let mut request = HttpRequest::new(
            descriptor.http_method(),
            join_url(&self.base_uri, descriptor.api_resource()),
        );

        if descriptor.http_method().has_body() {
            let binder = ResourceBinder::from_descriptor(&descriptor);
            let body = self.argument_builder.build(&Context::new(&binder))?;
            request.set_header("content-type", self.argument_builder.content_type());
            request.body = Some(body);
        }

        self.decorate(&mut request)?;
        Ok((descriptor, request))
    }

    /// Hand a response for `descriptor` to the response handler.
    pub fn parse_response(
        &self,
        descriptor: &MethodDescriptor,
        response: HttpResponse,
    ) -> Result<Resource, RestError> {
        self.response_handler()
            .build_response(self.format.format(), descriptor, response)
    }

    fn decorate(&self, request: &mut HttpRequest) -> Result<(), RestError> {
        if let Some(authentication) = &self.authentication {
            authentication.authenticate(request)?;
        }
        if let Some(versioning) = &self.versioning {
            versioning.version(request)?;
        }
        for feature in &self.features {
            feature.apply(request)?;
        }
        self.format.apply(request)
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RestError> {
        tracing::debug!(http = %request.method, url = %request.url, "sending request");
        let response = self.http_client().send(request)?;
        tracing::debug!(status = response.status, url = %request.url, "received response");
        Ok(response)
    }
}

impl RemoteCall for RestClient {
    fn call(&self, method: &str, params: &[Value]) -> Result<Resource, RestError> {
        RestClient::call(self, method, params)
    }
}

/// Follows links through the same strategies as regular calls. Absolute links
/// must stay on the origin of the base URI.
impl LinkFetcher for RestClient {
    fn fetch(&self, href: &str) -> Result<Resource, RestError> {
        let descriptor = MethodDescriptor::follow(href);
        let url = if href.contains("://") {
            let allowed = origin(&self.base_uri);
            if !origin(href).eq_ignore_ascii_case(allowed) {
                tracing::warn!(href, origin = allowed, "refusing to follow link to another origin");
                return Err(RestError::RelationFailed {
                    relation: href.to_string(),
                    message: format!("link leaves {allowed}"),
                });
            }
            href.to_string()
        } else {
            join_url(&self.base_uri, href)
        };
        let mut request = HttpRequest::new(HttpMethod::Get, url);
        self.decorate(&mut request)?;
        let response = self.send(&request)?;
        self.parse_response(&descriptor, response)
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_uri", &self.base_uri)
            .field("format", &self.format.format())
            .field("mapping", &self.mapping)
            .field("authentication", &self.authentication.is_some())
            .field("versioning", &self.versioning.is_some())
            .field("features", &self.features.len())
            .finish_non_exhaustive()
    }
}

fn join_url(base: &str, resource: &str) -> String {
    if resource.is_empty() || resource.starts_with('/') || resource.starts_with('?') {
        format!("{base}{resource}")
    } else {
        format!("{base}/{resource}")
    }
}

/// `scheme://authority` of an absolute URL.
fn origin(url: &str) -> &str {
    let Some(scheme_end) = url.find("://") else {
        return "";
    };
    let authority = scheme_end + 3;
    let end = url[authority..]
        .find(['/', '?', '#'])
        .map_or(url.len(), |index| authority + index);
    &url[..end]
}
