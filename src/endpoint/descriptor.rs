//! Immutable per-route endpoint configuration.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::endpoint::mime::{ApiMethod, Mime};
use crate::schema::{Schema, SchemaSpec};

/// Endpoint options as written in configuration.
///
/// Unknown keys and wrongly typed values are rejected while deserializing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointOptions {
    /// Accepted request method.
    pub method: ApiMethod,

    /// Expected request content type (POST only).
    #[serde(default = "default_mime")]
    pub request_type: Mime,

    /// Content type of the response body.
    #[serde(default = "default_mime")]
    pub response_type: Mime,

    /// Schema of the request body.
    #[serde(default)]
    pub format_body: SchemaSpec,

    /// Schema of the query parameters.
    #[serde(default)]
    pub format_url: SchemaSpec,

    /// Reject keys not declared in the schemas.
    #[serde(default = "default_true")]
    pub strict_format: bool,

    /// Charge the caller's rate quota.
    #[serde(default = "default_true")]
    pub req_quota: bool,

    /// Require an authenticated caller.
    #[serde(default = "default_true")]
    pub req_auth: bool,

    /// Accept session cookies in place of an `Auth-Token` (GET only).
    #[serde(default)]
    pub allow_cookie_auth: bool,
}

fn default_mime() -> Mime {
    Mime::Json
}

fn default_true() -> bool {
    true
}

impl EndpointOptions {
    /// Options with every default applied.
    pub fn new(method: ApiMethod) -> Self {
        Self {
            method,
            request_type: default_mime(),
            response_type: default_mime(),
            format_body: SchemaSpec::default(),
            format_url: SchemaSpec::default(),
            strict_format: true,
            req_quota: true,
            req_auth: true,
            allow_cookie_auth: false,
        }
    }
}

/// Validated endpoint configuration, shared read-only by all requests to a route.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDescriptor {
    method: ApiMethod,
    request_type: Mime,
    response_type: Mime,
    format_body: Schema,
    format_url: Schema,
    strict_format: bool,
    req_quota: bool,
    req_auth: bool,
    allow_cookie_auth: bool,
}

impl EndpointDescriptor {
    /// Build from a configuration map such as a parsed JSON object.
    pub fn from_config(config: serde_json::Value) -> Result<Self, ConfigError> {
        let options: EndpointOptions = serde_json::from_value(config)
            .map_err(|e| ConfigError::Endpoint(e.to_string()))?;
        Self::from_options(&options)
    }

    /// Build from deserialized options, compiling both schemas.
    pub fn from_options(options: &EndpointOptions) -> Result<Self, ConfigError> {
        let format_body = options
            .format_body
            .compile()
            .map_err(|e| ConfigError::Endpoint(format!("format_body: {}", e)))?;
        let format_url = options
            .format_url
            .compile()
            .map_err(|e| ConfigError::Endpoint(format!("format_url: {}", e)))?;

        if options.allow_cookie_auth && options.method == ApiMethod::Post {
            tracing::warn!("Cookie auth is never accepted on POST endpoints");
        }

        Ok(Self {
            method: options.method,
            request_type: options.request_type,
            response_type: options.response_type,
            format_body,
            format_url,
            strict_format: options.strict_format,
            req_quota: options.req_quota,
            req_auth: options.req_auth,
            allow_cookie_auth: options.allow_cookie_auth,
        })
    }

    /// Start a descriptor in code with every default applied.
    pub fn builder(method: ApiMethod) -> EndpointBuilder {
        EndpointBuilder {
            inner: Self {
                method,
                request_type: Mime::Json,
                response_type: Mime::Json,
                format_body: Schema::new(),
                format_url: Schema::new(),
                strict_format: true,
                req_quota: true,
                req_auth: true,
                allow_cookie_auth: false,
            },
        }
    }

    pub fn method(&self) -> ApiMethod {
        self.method
    }

    pub fn request_type(&self) -> Mime {
        self.request_type
    }

    pub fn response_type(&self) -> Mime {
        self.response_type
    }

    pub fn format_body(&self) -> &Schema {
        &self.format_body
    }

    pub fn format_url(&self) -> &Schema {
        &self.format_url
    }

    pub fn strict_format(&self) -> bool {
        self.strict_format
    }

    pub fn requires_quota(&self) -> bool {
        self.req_quota
    }

    pub fn requires_auth(&self) -> bool {
        self.req_auth
    }

    pub fn allows_cookie_auth(&self) -> bool {
        self.allow_cookie_auth
    }
}

/// Builder for descriptors declared in code.
#[derive(Debug, Clone)]
pub struct EndpointBuilder {
    inner: EndpointDescriptor,
}

impl EndpointBuilder {
    pub fn request_type(mut self, mime: Mime) -> Self {
        self.inner.request_type = mime;
        self
    }

    pub fn response_type(mut self, mime: Mime) -> Self {
        self.inner.response_type = mime;
        self
    }

    pub fn format_body(mut self, schema: Schema) -> Self {
        self.inner.format_body = schema;
        self
    }

    pub fn format_url(mut self, schema: Schema) -> Self {
        self.inner.format_url = schema;
        self
    }

    pub fn strict_format(mut self, strict: bool) -> Self {
        self.inner.strict_format = strict;
        self
    }

    pub fn req_quota(mut self, required: bool) -> Self {
        self.inner.req_quota = required;
        self
    }

    pub fn req_auth(mut self, required: bool) -> Self {
        self.inner.req_auth = required;
        self
    }

    pub fn allow_cookie_auth(mut self, allowed: bool) -> Self {
        self.inner.allow_cookie_auth = allowed;
        self
    }

    pub fn build(self) -> EndpointDescriptor {
        self.inner
    }
}
