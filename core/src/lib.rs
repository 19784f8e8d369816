//! Turns method calls into REST requests and responses into resources.
//!
//! # Overview
//! `RestClient::call("get", &[json!(1)])` resolves the method name through a
//! `MethodMapping` into `GET <base>/users/1`, runs the request through the
//! configured strategies, sends it with a `Transport` and hands the response
//! to a `ResponseHandler`, which decodes it and materializes a `Resource`.
//!
//! # Design
//! - The client holds configuration only; every call is independent.
//! - Verb and path resolution is an explicit table (`mapping`), not hidden
//!   string sniffing.
//! - Authentication, versioning, features, format, argument building,
//!   response handling and transport are traits with first-party impls, so
//!   each can be swapped or tested in isolation.
//! - Requests and responses are plain data (`http`); `build_request` and
//!   `parse_response` expose the two halves of a call for callers that do
//!   their own I/O.
//! - Related resources can be fetched lazily (`lazy`, `resource`).

pub mod argument;
pub mod auth;
pub mod client;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod feature;
pub mod format;
pub mod http;
pub mod lazy;
pub mod mapping;
pub mod resource;
pub mod response;
pub mod transport;
pub mod versioning;

pub use argument::{ArgumentBuilder, Context, JsonArgumentBuilder, ResourceBinder};
pub use auth::{AuthenticationStrategy, BearerAuthenticationStrategy, TokenAuthenticationStrategy};
pub use client::{RemoteCall, RestClient};
pub use config::ClientConfig;
pub use descriptor::MethodDescriptor;
pub use error::RestError;
pub use feature::{Feature, HeaderFeature, TimestampFeature};
pub use format::{DeclaredFormat, FormatStrategy, HeaderFormatStrategy};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use lazy::{LazyCell, LazyState};
pub use mapping::{MethodMapping, Route, VerbRule};
pub use resource::{LazyBuilder, LinkFetcher, Resource, ResourceObject, ResponseBuilder, StructuralBuilder};
pub use response::{DefaultResponseHandler, FormatDecoder, JsonDecoder, ResponseHandler};
pub use transport::{Transport, UreqTransport};
pub use versioning::{HeaderVersioningStrategy, QueryVersioningStrategy, VersioningStrategy};
