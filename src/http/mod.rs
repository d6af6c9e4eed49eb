//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, CORS headers, timeout)
//!     → [routing resolves the endpoint]
//!     → [dispatcher validates, authenticates, charges quota]
//!     → handlers.rs (business logic, sets the response)
//!     → Send to client
//! ```

pub mod handlers;
pub mod server;

pub use handlers::{handler, Handler};
pub use server::{AppState, HttpServer};
