//! Request methods and MIME types an endpoint can be configured with.

use std::fmt;

use axum::http::{HeaderValue, Method};
use serde::{Deserialize, Serialize};

/// Method an endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ApiMethod {
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "POST")]
    Post,
}

impl ApiMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMethod::Get => "GET",
            ApiMethod::Post => "POST",
        }
    }

    /// Returns true if the transport method is this method.
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            ApiMethod::Get => method == Method::GET,
            ApiMethod::Post => method == Method::POST,
        }
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Content types understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Mime {
    #[serde(rename = "application/json")]
    Json,
    #[serde(rename = "multipart/form-data")]
    Multipart,
    #[serde(rename = "text/plain")]
    Text,
}

impl Mime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mime::Json => "application/json",
            Mime::Multipart => "multipart/form-data",
            Mime::Text => "text/plain",
        }
    }

    /// Match a `Content-Type` header value against this type.
    ///
    /// Parameters such as `charset` or `boundary` are ignored, the type
    /// itself is compared case-insensitively.
    pub fn matches_header(&self, value: &str) -> bool {
        value
            .trim_start()
            .to_ascii_lowercase()
            .starts_with(self.as_str())
    }

    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}

impl fmt::Display for Mime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_matching() {
        assert!(Mime::Json.matches_header("application/json"));
        assert!(Mime::Json.matches_header("application/json; charset=utf-8"));
        assert!(Mime::Json.matches_header("Application/JSON"));
        assert!(!Mime::Json.matches_header("text/plain"));
        assert!(Mime::Multipart.matches_header("multipart/form-data; boundary=xyz"));
        assert!(!Mime::Multipart.matches_header("application/json"));
    }

    #[test]
    fn test_method_matching() {
        assert!(ApiMethod::Get.matches(&Method::GET));
        assert!(!ApiMethod::Get.matches(&Method::POST));
        assert!(ApiMethod::Post.matches(&Method::POST));
        assert!(!ApiMethod::Post.matches(&Method::PUT));
    }

    #[test]
    fn test_serde_names() {
        let mime: Mime = serde_json::from_str(r#""multipart/form-data""#).unwrap();
        assert_eq!(mime, Mime::Multipart);
        let method: ApiMethod = serde_json::from_str(r#""POST""#).unwrap();
        assert_eq!(method, ApiMethod::Post);
        assert!(serde_json::from_str::<ApiMethod>(r#""PUT""#).is_err());
    }
}
