//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, endpoint schemas compiled once)
//!     → ServerConfig (validated, immutable)
//!     → routing builds the endpoint table from it
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads and validates the new config
//!     → watcher.rs compiles the endpoint table
//!     → server swaps the endpoint table atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Listener, quota and auth settings are read at startup only

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AuthConfig, EndpointConfig, ListenerConfig, ObservabilityConfig, QuotaConfig, ServerConfig,
    TokenConfig,
};
pub use validation::ValidationError;
pub use watcher::{compile_endpoints, ConfigWatcher};
