//! Transport-level view of an incoming request.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request};

use crate::error::ApiError;

/// Bearer credential header.
pub const AUTH_TOKEN: &str = "auth-token";

/// Everything the dispatcher reads from the transport, passed explicitly.
#[derive(Debug)]
pub struct TransportRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Body,
}

impl TransportRequest {
    /// Split an HTTP request into its transport parts.
    pub fn from_http(request: Request<Body>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
        }
    }

    /// Start a request by hand, mostly for tests and embedding.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Body::empty(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Header value as text; non-ASCII values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Non-empty `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    /// Read the whole body, failing once `limit` bytes are exceeded.
    pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, ApiError> {
        axum::body::to_bytes(body, limit)
            .await
            .map_err(|e| ApiError::MalformedPayload(format!("failed to read request body: {}", e)))
    }
}
