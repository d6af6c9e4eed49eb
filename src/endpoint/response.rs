//! Response buffering and emission.

use axum::body::{Body, Bytes};
use axum::http::{header, StatusCode};
use axum::response::Response;
use serde_json::{Map, Value};

use crate::endpoint::mime::Mime;
use crate::error::{ApiError, ErrorCode};

/// Key every JSON response carries.
pub const ERROR_KEY: &str = "error";

/// Response data set by a business handler.
#[derive(Debug)]
pub enum ResponseBody {
    /// Structured payload for JSON endpoints.
    Json(Map<String, Value>),
    /// Raw bytes for non-JSON endpoints.
    Bytes(Bytes),
    /// Opaque stream passed through untouched.
    Stream(Body),
}

impl From<Map<String, Value>> for ResponseBody {
    fn from(map: Map<String, Value>) -> Self {
        ResponseBody::Json(map)
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        ResponseBody::Bytes(bytes)
    }
}

impl From<String> for ResponseBody {
    fn from(text: String) -> Self {
        ResponseBody::Bytes(Bytes::from(text))
    }
}

impl From<&'static str> for ResponseBody {
    fn from(text: &'static str) -> Self {
        ResponseBody::Bytes(Bytes::from_static(text.as_bytes()))
    }
}

/// Encode a buffered response for an endpoint with the given response type.
///
/// JSON responses always contain an `error` key, set to the ok code when the
/// handler left it out.
pub fn encode(mime: Mime, body: Option<ResponseBody>) -> Result<Response, ApiError> {
    let body = match (mime, body) {
        (Mime::Json, None) => json_body(Map::new())?,
        (Mime::Json, Some(ResponseBody::Json(map))) => json_body(map)?,
        (Mime::Json, Some(_)) => {
            return Err(ApiError::Internal(
                "raw response body on a JSON endpoint".to_string(),
            ))
        }
        (_, None) => Body::empty(),
        (_, Some(ResponseBody::Bytes(bytes))) => Body::from(bytes),
        (_, Some(ResponseBody::Stream(stream))) => stream,
        (_, Some(ResponseBody::Json(_))) => {
            return Err(ApiError::Internal(format!(
                "JSON response body on a {} endpoint",
                mime
            )))
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.header_value())
        .body(body)
        .map_err(|e| ApiError::Internal(format!("failed to build response: {}", e)))
}

fn json_body(mut map: Map<String, Value>) -> Result<Body, ApiError> {
    map.entry(ERROR_KEY)
        .or_insert_with(|| Value::from(ErrorCode::Ok.as_u8()));
    let bytes = serde_json::to_vec(&map)
        .map_err(|e| ApiError::Internal(format!("Failed to encode response JSON: {}", e)))?;
    Ok(Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn read(response: Response) -> Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap()
    }

    #[tokio::test]
    async fn test_json_gets_error_key() {
        let mut map = Map::new();
        map.insert("name".into(), json!("a"));
        let response = encode(Mime::Json, Some(map.into())).unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let decoded: Value = serde_json::from_slice(&read(response).await).unwrap();
        assert_eq!(decoded, json!({"name": "a", "error": 0}));
    }

    #[tokio::test]
    async fn test_json_keeps_handler_error() {
        let mut map = Map::new();
        map.insert("error".into(), json!(7));
        let decoded: Value =
            serde_json::from_slice(&read(encode(Mime::Json, Some(map.into())).unwrap()).await)
                .unwrap();
        assert_eq!(decoded, json!({"error": 7}));
    }

    #[tokio::test]
    async fn test_unset_json_response() {
        let decoded: Value =
            serde_json::from_slice(&read(encode(Mime::Json, None).unwrap()).await).unwrap();
        assert_eq!(decoded, json!({"error": 0}));
    }

    #[tokio::test]
    async fn test_raw_passthrough() {
        let response = encode(Mime::Text, Some("hello".into())).unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(read(response).await, Bytes::from_static(b"hello"));

        let response = encode(Mime::Text, Some(ResponseBody::Stream(Body::from("streamed")))).unwrap();
        assert_eq!(read(response).await, Bytes::from_static(b"streamed"));
    }

    #[test]
    fn test_mismatched_body_is_internal() {
        assert!(matches!(
            encode(Mime::Json, Some("raw".into())),
            Err(ApiError::Internal(_))
        ));
        assert!(matches!(
            encode(Mime::Text, Some(Map::new().into())),
            Err(ApiError::Internal(_))
        ));
    }
}
