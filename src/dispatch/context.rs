//! Per-request context handed to endpoint handlers.

use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::dispatch::auth::Caller;
use crate::endpoint::response::{self, ResponseBody};
use crate::endpoint::EndpointDescriptor;
use crate::error::ApiError;
use crate::request::{LoadedRequest, UploadedFile};
use crate::schema::DataTree;

/// Validated request data, the authenticated caller and the pending response.
#[derive(Debug)]
pub struct RequestContext {
    endpoint: Arc<EndpointDescriptor>,
    data: DataTree,
    files: Vec<UploadedFile>,
    caller: Option<Caller>,
    response: Option<ResponseBody>,
}

impl RequestContext {
    pub fn new(endpoint: Arc<EndpointDescriptor>, loaded: LoadedRequest) -> Self {
        Self {
            endpoint,
            data: loaded.data,
            files: loaded.files,
            caller: None,
            response: None,
        }
    }

    pub fn endpoint(&self) -> &EndpointDescriptor {
        &self.endpoint
    }

    pub fn data(&self) -> &DataTree {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Whether `key` is present. With `null_check`, a `null` value counts as absent.
    pub fn has(&self, key: &str, null_check: bool) -> bool {
        match self.data.get(key) {
            Some(Value::Null) => !null_check,
            Some(_) => true,
            None => false,
        }
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn caller(&self) -> Option<&Caller> {
        self.caller.as_ref()
    }

    pub fn user(&self) -> Option<&str> {
        self.caller.as_ref().map(|c| c.user.as_str())
    }

    pub fn session(&self) -> Option<&str> {
        self.caller.as_ref().map(|c| c.session.as_str())
    }

    pub(crate) fn set_caller(&mut self, caller: Caller) {
        self.caller = Some(caller);
    }

    /// Stage the response body. A later call replaces an earlier one.
    pub fn set_response(&mut self, body: impl Into<ResponseBody>) {
        self.response = Some(body.into());
    }

    /// Encode the staged response using the endpoint's response type.
    pub fn send(self) -> Result<Response, ApiError> {
        response::encode(self.endpoint.response_type(), self.response)
    }
}
