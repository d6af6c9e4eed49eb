//! Request dispatch pipeline.

use std::sync::Arc;

use axum::http::{header, Method};

use crate::dispatch::auth::{Authenticator, Caller};
use crate::dispatch::context::RequestContext;
use crate::dispatch::quota::{self, QuotaStore};
use crate::endpoint::{ApiMethod, EndpointDescriptor, Mime};
use crate::error::ApiError;
use crate::request::transport::AUTH_TOKEN;
use crate::request::{load, parse_query, FormData, Payload, TransportRequest};

/// Outcome of a successful dispatch.
#[derive(Debug)]
pub enum Dispatch {
    /// CORS preflight; answer with an empty success response.
    Preflight,
    /// Request accepted; run the endpoint handler.
    Proceed(RequestContext),
}

/// Limits applied while dispatching.
#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    /// Length of the rate quota window in seconds.
    pub rate_window_secs: u64,
    /// Maximum accepted request body size in bytes.
    pub max_body_size: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            rate_window_secs: 60,
            max_body_size: 10 * 1024 * 1024,
        }
    }
}

/// Runs the pre-handler pipeline for a resolved endpoint.
#[derive(Clone)]
pub struct Dispatcher {
    auth: Arc<dyn Authenticator>,
    quota: Arc<dyn QuotaStore>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        auth: Arc<dyn Authenticator>,
        quota: Arc<dyn QuotaStore>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            auth,
            quota,
            settings,
        }
    }

    pub fn settings(&self) -> DispatchSettings {
        self.settings
    }

    /// Dispatch `request` to `endpoint`.
    ///
    /// Steps run in order and the first failure ends the request:
    /// preflight, method, content type, load, auth, quota.
    pub async fn handle(
        &self,
        endpoint: Arc<EndpointDescriptor>,
        request: TransportRequest,
    ) -> Result<Dispatch, ApiError> {
        if request.method == Method::OPTIONS {
            tracing::debug!(path = %request.path, "Preflight request");
            return Ok(Dispatch::Preflight);
        }

        if !endpoint.method().matches(&request.method) {
            return Err(ApiError::MethodMismatch {
                found: request.method.to_string(),
                expected: endpoint.method(),
            });
        }

        if endpoint.method() == ApiMethod::Post {
            let content_type = request.content_type().ok_or_else(|| {
                ApiError::ContentTypeError(
                    "Missing or empty Content-Type header in request.".to_string(),
                )
            })?;
            if !endpoint.request_type().matches_header(content_type) {
                return Err(ApiError::ContentTypeError(format!(
                    "Invalid request MIME type '{}'. Expected '{}'.",
                    content_type,
                    endpoint.request_type()
                )));
            }
        }

        let TransportRequest {
            query,
            headers,
            body,
            ..
        } = request;

        let payload = match (endpoint.method(), endpoint.request_type()) {
            (ApiMethod::Get, _) => Payload::None,
            (ApiMethod::Post, Mime::Json) => Payload::Json(
                TransportRequest::read_body(body, self.settings.max_body_size).await?,
            ),
            (ApiMethod::Post, Mime::Multipart) => {
                Payload::Form(self.read_multipart(&headers, body).await?)
            }
            (ApiMethod::Post, Mime::Text) => return Err(ApiError::UnsupportedRequestShape),
        };

        let loaded = load(&endpoint, parse_query(query.as_deref()), payload)?;
        let mut ctx = RequestContext::new(endpoint.clone(), loaded);

        if endpoint.requires_auth() {
            let caller = self.authenticate(&endpoint, &headers)?;
            if endpoint.requires_quota() {
                self.charge(&caller, quota::unix_now())?;
            }
            ctx.set_caller(caller);
        }

        Ok(Dispatch::Proceed(ctx))
    }

    async fn read_multipart(
        &self,
        headers: &axum::http::HeaderMap,
        body: axum::body::Body,
    ) -> Result<FormData, ApiError> {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .ok_or_else(|| ApiError::ContentTypeError("Missing Content-Type header.".into()))?;
        let raw = TransportRequest::read_body(body, self.settings.max_body_size).await?;
        crate::request::multipart::read_form(content_type, raw.into(), self.settings.max_body_size)
            .await
    }

    /// Resolve the caller from the `Auth-Token` header, falling back to the
    /// session cookie on GET endpoints that allow it.
    fn authenticate(
        &self,
        endpoint: &EndpointDescriptor,
        headers: &axum::http::HeaderMap,
    ) -> Result<Caller, ApiError> {
        let caller = match headers.get(AUTH_TOKEN) {
            Some(token) => token
                .to_str()
                .ok()
                .and_then(|t| self.auth.verify_token(t)),
            None if endpoint.allows_cookie_auth() && endpoint.method() == ApiMethod::Get => {
                let cookie = headers
                    .get(header::COOKIE)
                    .and_then(|v| v.to_str().ok());
                self.auth.verify_session_cookie(cookie)
            }
            None => None,
        };

        match caller {
            Some(caller) => {
                tracing::debug!(user = %caller.user, "Caller authenticated");
                Ok(caller)
            }
            None => {
                tracing::warn!("Rejected unauthenticated request");
                Err(ApiError::NotAuthorized)
            }
        }
    }

    fn charge(&self, caller: &Caller, now: u64) -> Result<(), ApiError> {
        let handle = self
            .quota
            .open(&caller.user)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        quota::account(handle, now, self.settings.rate_window_secs).inspect_err(|e| {
            if matches!(e, ApiError::RateLimited) {
                tracing::warn!(user = %caller.user, "Caller rate limited");
            }
        })
    }
}
