//! Request validation and dispatch layer for JSON/multipart HTTP APIs.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────▶ http::server ──▶ routing (path → endpoint)
//!                                      │
//!                                      ▼
//!                               dispatch::Dispatcher
//!                 preflight → method → content type
//!                 → request::load (query/JSON/multipart + schema::verify)
//!                 → auth (Auth-Token / session cookie)
//!                 → quota (rate window)
//!                                      │
//!                                      ▼
//!                           handler(RequestContext)
//!     Client Response                  │
//!     ◀────────── endpoint::response (JSON with `error` key, or raw)
//! ```

pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod request;
pub mod routing;
pub mod schema;

pub use config::ServerConfig;
pub use dispatch::{Dispatcher, RequestContext};
pub use endpoint::EndpointDescriptor;
pub use error::ApiError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
