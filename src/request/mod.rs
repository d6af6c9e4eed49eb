//! Request extraction.
//!
//! # Data Flow
//! ```text
//! HTTP request
//!     → transport.rs (method, path, query, headers, body)
//!     → query.rs (query string → DataTree of strings)
//!     → multipart.rs (form body → text fields + files)
//!     → loader.rs (method × request type → validated DataTree)
//! ```
//!
//! # Design Decisions
//! - The loader never touches the transport; all inputs are parameters
//! - Body and query are validated against their own schemas
//! - Uploaded files are captured as-is

pub mod loader;
pub mod multipart;
pub mod query;
pub mod transport;

pub use loader::{load, LoadedRequest, Payload};
pub use multipart::{FormData, UploadedFile};
pub use query::parse_query;
pub use transport::TransportRequest;
