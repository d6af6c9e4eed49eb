//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::Response;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use api_dispatch::config::{parse_config, ServerConfig};
use api_dispatch::routing::EndpointRouter;
use api_dispatch::{HttpServer, Shutdown};

pub const TOKEN: &str = "tok-alice";
pub const BOUNDARY: &str = "XTESTBOUNDARYX";

/// Endpoints covering every request shape the dispatcher supports.
pub const TEST_CONFIG: &str = r#"
[listener]
bind_address = "127.0.0.1:0"

[quota]
rate_window_secs = 60
rate_limit = 3

[[auth.tokens]]
token = "tok-alice"
user = "alice"
session = "sess-alice"

[[endpoints]]
path = "/api/ping"
handler = "ping"
[endpoints.options]
method = "GET"
req_auth = false

[[endpoints]]
path = "/api/echo"
handler = "echo"
[endpoints.options]
method = "POST"
req_auth = false
[endpoints.options.format_body]
name = "str"
age = ["int", "opt"]
[endpoints.options.format_body.address]
city = "str"

[[endpoints]]
path = "/api/search"
handler = "echo"
[endpoints.options]
method = "GET"
req_auth = false
[endpoints.options.format_url]
q = "str"
tags = ["arr_str", "opt"]

[[endpoints]]
path = "/api/me"
handler = "whoami"
[endpoints.options]
method = "GET"
allow_cookie_auth = true

[[endpoints]]
path = "/api/post-me"
handler = "whoami"
[endpoints.options]
method = "POST"
allow_cookie_auth = true

[[endpoints]]
path = "/api/upload"
handler = "upload"
[endpoints.options]
method = "POST"
request_type = "multipart/form-data"
req_auth = false
[endpoints.options.format_body]
title = "str"

[[endpoints]]
path = "/api/hello"
handler = "text"
[endpoints.options]
method = "GET"
response_type = "text/plain"
req_auth = false
"#;

pub fn test_config() -> ServerConfig {
    parse_config(TEST_CONFIG).unwrap()
}

/// Multipart body with a `body` JSON field and one file part.
pub fn multipart_body(json: &str) -> String {
    format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"body\"\r\n\r\n\
         {json}\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"0\"; filename=\"cat.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         PNGDATA\r\n\
         --{b}--\r\n",
        b = BOUNDARY,
        json = json
    )
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub updates: mpsc::UnboundedSender<EndpointRouter>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn spawn_server(config: ServerConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();
    let (updates, updates_rx) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, updates_rx, shutdown.subscribe()));

    TestServer {
        addr,
        updates,
        shutdown,
        handle,
    }
}
