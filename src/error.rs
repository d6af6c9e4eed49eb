//! Request-level errors and their HTTP representation.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::endpoint::mime::{ApiMethod, Mime};
use crate::schema::SchemaViolation;

/// Numeric error codes carried in the `error` field of JSON responses.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Ok = 0,
    Internal = 1,
    InvalidRequest = 2,
    NotAuthorized = 3,
    RateLimited = 4,
    BadMethod = 5,
    NotFound = 6,
}

impl ErrorCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Errors that terminate a request.
///
/// Every variant is final for the current request; nothing is retried.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body could not be read or parsed.
    #[error("Malformed request payload: {0}")]
    MalformedPayload(String),

    /// Parsed body is not an object.
    #[error("Invalid request data. Expected an object as the root element.")]
    InvalidRootShape,

    /// Multipart form does not follow the single `body` field convention.
    #[error("Invalid multipart request data. {0}")]
    MalformedMultipart(String),

    /// Request data does not conform to the endpoint schema.
    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    #[error("Invalid request method '{found}'. Expected '{expected}'.")]
    MethodMismatch { found: String, expected: ApiMethod },

    #[error("{0}")]
    ContentTypeError(String),

    #[error("Unsupported request method or content type.")]
    UnsupportedRequestShape,

    #[error("Unknown API endpoint '{0}'.")]
    UnknownEndpoint(String),

    /// No valid credentials. Missing and invalid credentials look the same.
    #[error("Not authenticated.")]
    NotAuthorized,

    #[error("API rate limited.")]
    RateLimited,

    /// Detail is logged, never sent to the caller.
    #[error("Internal server error.")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedPayload(_)
            | ApiError::InvalidRootShape
            | ApiError::MalformedMultipart(_)
            | ApiError::Schema(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodMismatch { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::ContentTypeError(_) | ApiError::UnsupportedRequestShape => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ApiError::UnknownEndpoint(_) => StatusCode::NOT_FOUND,
            ApiError::NotAuthorized => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::MethodMismatch { .. } => ErrorCode::BadMethod,
            ApiError::UnknownEndpoint(_) => ErrorCode::NotFound,
            ApiError::NotAuthorized => ErrorCode::NotAuthorized,
            ApiError::RateLimited => ErrorCode::RateLimited,
            ApiError::Internal(_) => ErrorCode::Internal,
            _ => ErrorCode::InvalidRequest,
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::MalformedPayload(_) => "malformed_payload",
            ApiError::InvalidRootShape => "invalid_root_shape",
            ApiError::MalformedMultipart(_) => "malformed_multipart",
            ApiError::Schema(SchemaViolation::MissingField(_)) => "missing_field",
            ApiError::Schema(SchemaViolation::TypeMismatch { .. }) => "type_mismatch",
            ApiError::Schema(SchemaViolation::InvalidType { .. }) => "invalid_type",
            ApiError::Schema(SchemaViolation::EmptyValueRejected(_)) => "empty_value",
            ApiError::Schema(SchemaViolation::ExtraKeys(_)) => "extra_keys",
            ApiError::MethodMismatch { .. } => "method_mismatch",
            ApiError::ContentTypeError(_) => "content_type",
            ApiError::UnsupportedRequestShape => "unsupported_shape",
            ApiError::UnknownEndpoint(_) => "unknown_endpoint",
            ApiError::NotAuthorized => "not_authorized",
            ApiError::RateLimited => "rate_limited",
            ApiError::Internal(_) => "internal",
        }
    }

    /// Render as a response for an endpoint answering with `mime`.
    ///
    /// JSON endpoints get `{"error": code, "message": ...}`, everything else
    /// (including unresolved endpoints) gets the message as plain text.
    pub fn into_response_as(self, mime: Option<Mime>) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(detail = %detail, "Internal error while handling request");
        }

        let status = self.status();
        match mime {
            Some(Mime::Json) => {
                let body = serde_json::json!({
                    "error": self.code().as_u8(),
                    "message": self.to_string(),
                });
                (status, axum::Json(body)).into_response()
            }
            _ => (
                status,
                [(header::CONTENT_TYPE, Mime::Text.header_value())],
                self.to_string(),
            )
                .into_response(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_response_as(Some(Mime::Json))
    }
}
