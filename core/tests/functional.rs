//! End-to-end calls against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port, then drives a
//! `RestClient` over real HTTP with `UreqTransport`. A recording wrapper keeps
//! the last request so the raw wire form can be asserted after the call.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use rest_remote::{
    DefaultResponseHandler, HeaderFormatStrategy, HeaderVersioningStrategy, HttpMethod, HttpRequest,
    HttpResponse, LazyBuilder, MethodMapping, RemoteCall, RestClient, RestError, Route,
    TimestampFeature, TokenAuthenticationStrategy, Transport, UreqTransport,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Location {
    id: u64,
    city: String,
}

/// Hand-written facade over the remote-call contract, standing in for a
/// generated proxy.
struct UserService<C: RemoteCall> {
    remote: C,
}

impl<C: RemoteCall> UserService<C> {
    fn get(&self, id: u64) -> Result<User, RestError> {
        self.remote.call_typed("get", &[json!(id)])
    }

    fn create(&self, name: &str) -> Result<User, RestError> {
        self.remote.call_typed("create", &[json!({ "name": name })])
    }

    fn users_from_location(&self, location: u64, offset: u64, limit: u64) -> Result<Vec<User>, RestError> {
        self.remote.call_typed(
            "getUsersFromLocation",
            &[json!({ "id": location }), json!({ "offset": offset, "limit": limit })],
        )
    }
}

/// Delegates to `UreqTransport` and remembers the last request.
struct RecordingTransport {
    inner: UreqTransport,
    last: Mutex<Option<HttpRequest>>,
}

impl RecordingTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: UreqTransport::new(),
            last: Mutex::new(None),
        })
    }

    fn last_raw_request(&self) -> String {
        self.last
            .lock()
            .unwrap()
            .as_ref()
            .map(ToString::to_string)
            .expect("no request sent")
    }
}

impl Transport for RecordingTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RestError> {
        *self.last.lock().unwrap() = Some(request.clone());
        self.inner.send(request)
    }
}

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn setup() -> (RestClient, Arc<RecordingTransport>, String) {
    let base = format!("http://{}", start_server());
    let transport = RecordingTransport::new();
    let mapping = MethodMapping::new("users").with_route(
        Route::new(
            "getUsersFromLocation",
            HttpMethod::Get,
            "/locations/{location.id}/users",
        )
        .unwrap(),
    );

    let mut client = RestClient::new(&base);
    client
        .set_method_mapping(mapping)
        .set_format_strategy(HeaderFormatStrategy::new("json"))
        .set_http_client(transport.clone());
    (client, transport, base)
}

#[test]
fn can_make_a_get_request() {
    let (client, transport, base) = setup();
    let service = UserService { remote: client };

    let user = service.get(1).unwrap();
    assert_eq!(user, User { id: 1, name: "Vincent".to_string() });
    assert_eq!(
        transport.last_raw_request(),
        format!("GET {base}/users/1 HTTP/1.1\r\nContent-type: application/json\r\n\r\n")
    );
}

#[test]
fn can_make_a_post_request() {
    let (client, transport, base) = setup();
    let service = UserService { remote: client };

    let user = service.create("Dave").unwrap();
    assert_eq!(user.name, "Dave");
    assert_eq!(
        transport.last_raw_request(),
        format!("POST {base}/users HTTP/1.1\r\nContent-type: application/json\r\n\r\n{{\"name\":\"Dave\"}}")
    );
}

#[test]
fn can_make_a_paginated_request() {
    let (client, _, _) = setup();
    let service = UserService { remote: client };

    let users = service.users_from_location(1, 0, 20).unwrap();
    assert_eq!(users.len(), 2);

    let page = service.users_from_location(1, 1, 20).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].name, "Alice");
}

#[test]
fn can_update_and_delete() {
    let (client, transport, base) = setup();

    let updated: User = client
        .call_typed("update", &[json!({"id": 2, "name": "Alicia"})])
        .unwrap();
    assert_eq!(updated.name, "Alicia");
    assert!(transport.last_raw_request().starts_with(&format!("PUT {base}/users HTTP/1.1")));

    let deleted = client.call("delete", &[json!(2)]).unwrap();
    assert_eq!(deleted.as_scalar(), Some(&serde_json::Value::Null));
    assert!(transport.last_raw_request().starts_with(&format!("DELETE {base}/users/2 HTTP/1.1")));

    let err = client.call("get", &[json!(2)]).unwrap_err();
    assert!(matches!(err, RestError::HttpStatus { status: 404, .. }));
}

#[test]
fn can_version_api() {
    let (mut client, transport, base) = setup();
    client.set_versioning_strategy(HeaderVersioningStrategy::new("v3"));

    client.call("get", &[json!(1)]).unwrap();
    assert_eq!(
        transport.last_raw_request(),
        format!("GET {base}/users/1 HTTP/1.1\r\nRest-Version: v3\r\nContent-type: application/json\r\n\r\n")
    );
}

#[test]
fn can_authenticate_request() {
    let (mut client, transport, base) = setup();
    client.set_authentication_strategy(TokenAuthenticationStrategy::new("qwerty"));

    client.call("get", &[json!(1)]).unwrap();
    assert_eq!(
        transport.last_raw_request(),
        format!("GET {base}/users/1?token=qwerty HTTP/1.1\r\nContent-type: application/json\r\n\r\n")
    );
}

#[test]
fn can_add_timestamp_feature() {
    let (mut client, transport, base) = setup();
    client.add_feature(TimestampFeature);

    let before = chrono::Utc::now().timestamp();
    client.call("get", &[json!(1)]).unwrap();
    let after = chrono::Utc::now().timestamp();

    let raw = transport.last_raw_request();
    let prefix = format!("GET {base}/users/1?t=");
    let stamp: i64 = raw
        .strip_prefix(&prefix)
        .and_then(|rest| rest.split(' ').next())
        .and_then(|stamp| stamp.parse().ok())
        .expect("timestamp query parameter");
    assert!(before <= stamp && stamp <= after);
}

#[test]
fn can_pilot_result_object() {
    let (mut client, _, _) = setup();
    let handler = DefaultResponseHandler::new().with_response_builder(LazyBuilder::new(client.clone()));
    client.set_response_handler(handler);

    let user = client.call("get", &[json!(1)]).unwrap();
    let locations: Vec<Location> = user
        .as_object()
        .unwrap()
        .relation("locations")
        .unwrap()
        .deserialize()
        .unwrap();
    assert_eq!(locations, vec![Location { id: 1, city: "Paris".to_string() }]);
}

#[test]
fn server_error_is_http_status() {
    let (mut client, _, _) = setup();
    client.set_method_mapping(
        MethodMapping::new("users")
            .with_route(Route::new("explode", HttpMethod::Get, "/failure").unwrap()),
    );

    let err = client.call("explode", &[]).unwrap_err();
    match err {
        RestError::HttpStatus { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal error");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn connection_refused_is_transport_error() {
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let mut client = RestClient::new(&format!("http://{addr}"));
    client.set_method_mapping(MethodMapping::new("users"));

    let err = client.call("get", &[json!(1)]).unwrap_err();
    assert!(matches!(err, RestError::Transport { .. }));
}
