//! Endpoint descriptors.
//!
//! # Data Flow
//! ```text
//! EndpointOptions (config map)
//!     → descriptor.rs (type checks, defaults, schema compilation)
//!     → Arc<EndpointDescriptor> (immutable, shared by all requests)
//!
//! business handler result:
//!     → response.rs (JSON with `error` key, or raw bytes/stream)
//!     → HTTP response
//! ```

pub mod descriptor;
pub mod mime;
pub mod response;

pub use descriptor::{EndpointBuilder, EndpointDescriptor, EndpointOptions};
pub use mime::{ApiMethod, Mime};
pub use response::ResponseBody;
