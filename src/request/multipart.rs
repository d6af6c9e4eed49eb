//! Multipart form decoding.

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart};
use axum::http::{header, HeaderValue, Method, Request};
use tower::{service_fn, Layer, ServiceExt};

use crate::error::ApiError;

/// An uploaded file part. Stored as received, never validated here.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Decoded multipart form: text fields in arrival order plus file parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    pub fields: Vec<(String, String)>,
    pub files: Vec<UploadedFile>,
}

impl FormData {
    /// Value of the only text field if it has the given name.
    pub fn sole_field(&self, name: &str) -> Option<&str> {
        match self.fields.as_slice() {
            [(field, value)] if field == name => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Decode a `multipart/form-data` body of at most `limit` bytes.
///
/// The extractor runs behind `DefaultBodyLimit` so axum's built-in 2 MiB
/// cap is replaced by `limit`.
pub async fn read_form(
    content_type: &HeaderValue,
    body: Body,
    limit: usize,
) -> Result<FormData, ApiError> {
    let request = Request::builder()
        .method(Method::POST)
        .header(header::CONTENT_TYPE, content_type.clone())
        .body(body)
        .map_err(|e| ApiError::Internal(format!("failed to rebuild multipart request: {}", e)))?;

    let extract = service_fn(|request: Request<Body>| async move {
        Ok::<_, Infallible>(Multipart::from_request(request, &()).await)
    });
    let mut multipart = DefaultBodyLimit::max(limit)
        .layer(extract)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {})
        .map_err(|e| ApiError::MalformedMultipart(e.body_text()))?;

    let mut form = FormData::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::MalformedMultipart(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::MalformedMultipart(e.body_text()))?;
                form.files.push(UploadedFile {
                    field: name,
                    file_name,
                    content_type,
                    data,
                });
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::MalformedMultipart(e.body_text()))?;
                form.fields.push((name, value));
            }
        }
    }

    tracing::debug!(
        fields = form.fields.len(),
        files = form.files.len(),
        "Multipart form decoded"
    );
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "XBOUNDARYX";
    const LIMIT: usize = 10 * 1024 * 1024;

    fn content_type() -> HeaderValue {
        HeaderValue::from_str(&format!("multipart/form-data; boundary={}", BOUNDARY)).unwrap()
    }

    fn form_body() -> String {
        format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"body\"\r\n\r\n\
             {{\"title\":\"cat\"}}\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"0\"; filename=\"cat.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             PNGDATA\r\n\
             --{b}--\r\n",
            b = BOUNDARY
        )
    }

    #[tokio::test]
    async fn test_fields_and_files() {
        let form = read_form(&content_type(), Body::from(form_body()), LIMIT).await.unwrap();
        assert_eq!(form.sole_field("body"), Some(r#"{"title":"cat"}"#));
        assert_eq!(form.files.len(), 1);
        let file = &form.files[0];
        assert_eq!(file.field, "0");
        assert_eq!(file.file_name, "cat.png");
        assert_eq!(file.content_type.as_deref(), Some("image/png"));
        assert_eq!(file.size(), 7);
    }

    #[tokio::test]
    async fn test_missing_boundary() {
        let result = read_form(
            &HeaderValue::from_static("multipart/form-data"),
            Body::from(form_body()),
            LIMIT,
        )
        .await;
        assert!(matches!(result, Err(ApiError::MalformedMultipart(_))));
    }

    fn file_body(size: usize) -> Vec<u8> {
        let mut body = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"0\"; filename=\"big.bin\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n",
            b = BOUNDARY
        )
        .into_bytes();
        body.extend(std::iter::repeat(b'x').take(size));
        body.extend(format!("\r\n--{}--\r\n", BOUNDARY).into_bytes());
        body
    }

    #[tokio::test]
    async fn test_file_above_axum_default_limit() {
        let size = 3 * 1024 * 1024;
        let form = read_form(&content_type(), Body::from(file_body(size)), LIMIT)
            .await
            .unwrap();
        assert_eq!(form.files[0].size(), size);
    }

    #[tokio::test]
    async fn test_limit_applies() {
        let result = read_form(&content_type(), Body::from(file_body(4096)), 1024).await;
        assert!(matches!(result, Err(ApiError::MalformedMultipart(_))));
    }

    #[test]
    fn test_sole_field() {
        let mut form = FormData::default();
        assert_eq!(form.sole_field("body"), None);
        form.fields.push(("body".into(), "{}".into()));
        assert_eq!(form.sole_field("body"), Some("{}"));
        form.fields.push(("extra".into(), "1".into()));
        assert_eq!(form.sole_field("body"), None);
    }
}
