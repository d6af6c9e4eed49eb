//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that endpoints name a known handler and compile
//! - Validate value ranges (timeouts > 0, windows > 0, addresses parse)
//! - Detect duplicate endpoint paths and tokens
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::ServerConfig;
use crate::endpoint::EndpointDescriptor;
use crate::http::handlers;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("invalid socket address '{}'", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be > 0"));
    }

    if config.quota.rate_window_secs == 0 {
        errors.push(ValidationError::new("quota.rate_window_secs", "must be > 0"));
    }

    if config.quota.rate_limit == 0 {
        errors.push(ValidationError::new("quota.rate_limit", "must be > 0"));
    }

    if config.auth.cookie_name.is_empty() {
        errors.push(ValidationError::new("auth.cookie_name", "must not be empty"));
    }

    let mut tokens = HashSet::new();
    for (i, entry) in config.auth.tokens.iter().enumerate() {
        if entry.token.is_empty() {
            errors.push(ValidationError::new(
                format!("auth.tokens[{}].token", i),
                "must not be empty",
            ));
        } else if !tokens.insert(entry.token.as_str()) {
            errors.push(ValidationError::new(
                format!("auth.tokens[{}].token", i),
                "duplicate token",
            ));
        }
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}', expected 'pretty' or 'json'", other),
        )),
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "invalid socket address '{}'",
                config.observability.metrics_address
            ),
        ));
    }

    let mut paths = HashSet::new();
    for (i, endpoint) in config.endpoints.iter().enumerate() {
        let field = format!("endpoints[{}]", i);

        if !endpoint.path.starts_with('/') {
            errors.push(ValidationError::new(
                format!("{}.path", field),
                format!("'{}' must start with '/'", endpoint.path),
            ));
        }
        if !paths.insert(endpoint.path.as_str()) {
            errors.push(ValidationError::new(
                format!("{}.path", field),
                format!("duplicate path '{}'", endpoint.path),
            ));
        }
        if !handlers::is_builtin(&endpoint.handler) {
            errors.push(ValidationError::new(
                format!("{}.handler", field),
                format!("unknown handler '{}'", endpoint.handler),
            ));
        }
        if let Err(e) = EndpointDescriptor::from_options(&endpoint.options) {
            errors.push(ValidationError::new(format!("{}.options", field), e.to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
