//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (exact path lookup)
//!     → Return: Route (descriptor + handler) or NoMatch
//!
//! Route Compilation (at startup and on reload):
//!     EndpointConfig[]
//!     → Bind handler by name
//!     → Compile descriptor (schemas, defaults)
//!     → Freeze as immutable EndpointRouter
//! ```
//!
//! # Design Decisions
//! - Routes compiled once, immutable at runtime
//! - No pattern matching: one path, one endpoint
//! - Explicit NoMatch rather than silent default

pub mod router;

pub use router::{EndpointRouter, Route};
