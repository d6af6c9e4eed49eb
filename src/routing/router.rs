//! Endpoint lookup.
//!
//! # Responsibilities
//! - Compile endpoint configs into descriptors bound to handlers
//! - Look up the endpoint for a request path
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction; reloads build a new table
//! - O(1) exact path lookup via HashMap
//! - One trailing slash is ignored, so `/api/ping/` finds `/api/ping`

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ConfigError, EndpointConfig};
use crate::endpoint::EndpointDescriptor;
use crate::http::handlers::{self, Handler};

/// A resolved endpoint.
#[derive(Clone)]
pub struct Route {
    /// Path the endpoint is mounted on; also its metrics label.
    pub path: String,
    pub descriptor: Arc<EndpointDescriptor>,
    pub handler: Handler,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Path → endpoint table.
#[derive(Debug, Clone, Default)]
pub struct EndpointRouter {
    routes: HashMap<String, Route>,
}

impl EndpointRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from configuration, binding built-in handlers by name.
    pub fn from_config(endpoints: &[EndpointConfig]) -> Result<Self, ConfigError> {
        let mut router = Self::new();
        for endpoint in endpoints {
            let handler = handlers::builtin(&endpoint.handler).ok_or_else(|| {
                ConfigError::Endpoint(format!(
                    "{}: unknown handler '{}'",
                    endpoint.path, endpoint.handler
                ))
            })?;
            let descriptor = EndpointDescriptor::from_options(&endpoint.options)
                .map_err(|e| ConfigError::Endpoint(format!("{}: {}", endpoint.path, e)))?;
            router.insert(&endpoint.path, descriptor, handler);
        }

        tracing::info!(endpoints = router.len(), "Endpoint table compiled");
        Ok(router)
    }

    /// Mount `handler` on `path`, replacing any earlier endpoint there.
    pub fn insert(&mut self, path: &str, descriptor: EndpointDescriptor, handler: Handler) {
        let path = normalize(path).to_string();
        self.routes.insert(
            path.clone(),
            Route {
                path,
                descriptor: Arc::new(descriptor),
                handler,
            },
        );
    }

    /// Builder-style `insert`.
    pub fn route(mut self, path: &str, descriptor: EndpointDescriptor, handler: Handler) -> Self {
        self.insert(path, descriptor, handler);
        self
    }

    pub fn match_path(&self, path: &str) -> Option<&Route> {
        self.routes.get(normalize(path))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn normalize(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    }
}
