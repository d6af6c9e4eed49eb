//! Request data loading.
//!
//! What is loaded depends on the endpoint method and request type:
//!
//! | method | request type | data                                     |
//! |--------|--------------|------------------------------------------|
//! | GET    | any          | query parameters                         |
//! | POST   | JSON         | body merged with query parameters        |
//! | POST   | multipart    | query parameters + `body` field, files   |
//! | other  |              | `UnsupportedRequestShape`                |

use axum::body::Bytes;
use serde_json::Value;

use crate::endpoint::{ApiMethod, EndpointDescriptor, Mime};
use crate::error::ApiError;
use crate::request::multipart::{FormData, UploadedFile};
use crate::schema::{verify, DataTree};

/// Name of the multipart field carrying the JSON body.
pub const BODY_FIELD: &str = "body";

/// Raw payload handed to the loader by the dispatcher.
#[derive(Debug)]
pub enum Payload {
    None,
    Json(Bytes),
    Form(FormData),
}

/// Validated request data.
#[derive(Debug, Default, PartialEq)]
pub struct LoadedRequest {
    pub data: DataTree,
    pub files: Vec<UploadedFile>,
}

/// Load and validate request data for `endpoint`.
///
/// For JSON POST the merged tree is checked against the body schema and the
/// query alone against the query schema. On key collisions query values win.
pub fn load(
    endpoint: &EndpointDescriptor,
    query: DataTree,
    payload: Payload,
) -> Result<LoadedRequest, ApiError> {
    let strict = endpoint.strict_format();
    match (endpoint.method(), endpoint.request_type(), payload) {
        (ApiMethod::Get, _, _) => {
            verify(&query, endpoint.format_url(), strict)?;
            Ok(LoadedRequest {
                data: query,
                files: Vec::new(),
            })
        }
        (ApiMethod::Post, Mime::Json, Payload::Json(raw)) => {
            let merged = merge(parse_json(&raw)?, query.clone());
            verify(&merged, endpoint.format_body(), strict)?;
            verify(&query, endpoint.format_url(), strict)?;
            Ok(LoadedRequest {
                data: merged,
                files: Vec::new(),
            })
        }
        (ApiMethod::Post, Mime::Multipart, Payload::Form(form)) => {
            verify(&query, endpoint.format_url(), strict)?;
            let data = if endpoint.format_body().is_empty() {
                query
            } else {
                let raw = form.sole_field(BODY_FIELD).ok_or_else(|| {
                    ApiError::MalformedMultipart("Missing 'body' or extra data.".to_string())
                })?;
                let body = parse_json(raw.as_bytes())?;
                verify(&body, endpoint.format_body(), strict)?;
                merge(body, query)
            };
            Ok(LoadedRequest {
                data,
                files: form.files,
            })
        }
        _ => Err(ApiError::UnsupportedRequestShape),
    }
}

/// Parse a JSON body. Empty input and a `null` root load as an empty tree.
pub fn parse_json(raw: &[u8]) -> Result<DataTree, ApiError> {
    if raw.is_empty() {
        return Ok(DataTree::new());
    }
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| ApiError::MalformedPayload(format!("JSON parsing failed: {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(DataTree::new()),
        _ => Err(ApiError::InvalidRootShape),
    }
}

fn merge(mut body: DataTree, query: DataTree) -> DataTree {
    body.extend(query);
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::query::parse_query;
    use crate::schema::{Schema, SchemaViolation, TypeFlags};
    use serde_json::json;

    fn person() -> Schema {
        Schema::new()
            .field("name", TypeFlags::STR)
            .field("age", TypeFlags::INT.optional())
    }

    fn json_endpoint() -> EndpointDescriptor {
        EndpointDescriptor::builder(ApiMethod::Post)
            .format_body(person())
            .build()
    }

    fn json_payload(body: &str) -> Payload {
        Payload::Json(Bytes::copy_from_slice(body.as_bytes()))
    }

    #[test]
    fn test_json_post_succeeds() {
        let loaded = load(&json_endpoint(), DataTree::new(), json_payload(r#"{"name":"a"}"#)).unwrap();
        assert_eq!(Value::Object(loaded.data), json!({"name": "a"}));
        assert!(loaded.files.is_empty());
    }

    #[test]
    fn test_json_post_missing_field() {
        let err = load(&json_endpoint(), DataTree::new(), json_payload(r#"{"age":5}"#)).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Schema(SchemaViolation::MissingField(ref f)) if f == "name"
        ));
    }

    #[test]
    fn test_json_errors() {
        let endpoint = json_endpoint();
        assert!(matches!(
            load(&endpoint, DataTree::new(), json_payload("{nope")),
            Err(ApiError::MalformedPayload(_))
        ));
        assert!(matches!(
            load(&endpoint, DataTree::new(), json_payload("[1, 2]")),
            Err(ApiError::InvalidRootShape)
        ));
    }

    #[test]
    fn test_empty_body_is_empty_tree() {
        let endpoint = EndpointDescriptor::builder(ApiMethod::Post).build();
        let loaded = load(&endpoint, DataTree::new(), json_payload("")).unwrap();
        assert!(loaded.data.is_empty());
        assert!(parse_json(b"null").unwrap().is_empty());
    }

    #[test]
    fn test_query_wins_on_collision() {
        let endpoint = EndpointDescriptor::builder(ApiMethod::Post)
            .format_body(Schema::new().field("name", TypeFlags::STR))
            .format_url(Schema::new().field("name", TypeFlags::STR))
            .build();
        let loaded = load(
            &endpoint,
            parse_query(Some("name=from-query")),
            json_payload(r#"{"name":"from-body"}"#),
        )
        .unwrap();
        assert_eq!(loaded.data["name"], "from-query");
    }

    #[test]
    fn test_query_supplies_body_field() {
        let endpoint = EndpointDescriptor::builder(ApiMethod::Post)
            .format_body(Schema::new().field("name", TypeFlags::STR))
            .strict_format(false)
            .build();
        let loaded = load(&endpoint, parse_query(Some("name=a")), json_payload("{}")).unwrap();
        assert_eq!(Value::Object(loaded.data), json!({"name": "a"}));
    }

    #[test]
    fn test_merged_tree_checked_against_body_schema() {
        let endpoint = EndpointDescriptor::builder(ApiMethod::Post)
            .format_body(person().field("page", TypeFlags::STR.optional()))
            .format_url(Schema::new().field("page", TypeFlags::STR))
            .build();
        let loaded = load(
            &endpoint,
            parse_query(Some("page=2")),
            json_payload(r#"{"name":"a"}"#),
        )
        .unwrap();
        assert_eq!(Value::Object(loaded.data), json!({"name": "a", "page": "2"}));

        // Query keys land in the merged tree, so strict body checks see them.
        let strict = EndpointDescriptor::builder(ApiMethod::Post)
            .format_body(person())
            .format_url(Schema::new().field("page", TypeFlags::STR))
            .build();
        let err = load(
            &strict,
            parse_query(Some("page=2")),
            json_payload(r#"{"name":"a"}"#),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Schema(SchemaViolation::ExtraKeys(_))));

        let err = load(
            &endpoint,
            parse_query(Some("page=2&debug=1")),
            json_payload(r#"{"name":"a"}"#),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Schema(SchemaViolation::ExtraKeys(_))));
    }

    #[test]
    fn test_get_uses_query_only() {
        let endpoint = EndpointDescriptor::builder(ApiMethod::Get)
            .format_url(Schema::new().field("id", TypeFlags::STR))
            .build();
        let loaded = load(&endpoint, parse_query(Some("id=7")), Payload::None).unwrap();
        assert_eq!(Value::Object(loaded.data), json!({"id": "7"}));

        let err = load(&endpoint, DataTree::new(), Payload::None).unwrap_err();
        assert!(matches!(err, ApiError::Schema(SchemaViolation::MissingField(_))));
    }

    fn multipart_endpoint(body: Schema) -> EndpointDescriptor {
        EndpointDescriptor::builder(ApiMethod::Post)
            .request_type(Mime::Multipart)
            .format_body(body)
            .build()
    }

    fn file() -> UploadedFile {
        UploadedFile {
            field: "0".into(),
            file_name: "a.png".into(),
            content_type: Some("image/png".into()),
            data: Bytes::from_static(b"png"),
        }
    }

    #[test]
    fn test_multipart_body_field() {
        let form = FormData {
            fields: vec![("body".into(), r#"{"name":"a"}"#.into())],
            files: vec![file()],
        };
        let loaded = load(&multipart_endpoint(person()), DataTree::new(), Payload::Form(form)).unwrap();
        assert_eq!(Value::Object(loaded.data), json!({"name": "a"}));
        assert_eq!(loaded.files, vec![file()]);
    }

    #[test]
    fn test_multipart_missing_body_field() {
        let form = FormData {
            fields: Vec::new(),
            files: vec![file()],
        };
        let err = load(&multipart_endpoint(person()), DataTree::new(), Payload::Form(form)).unwrap_err();
        assert!(matches!(err, ApiError::MalformedMultipart(_)));
    }

    #[test]
    fn test_multipart_extra_fields() {
        let form = FormData {
            fields: vec![
                ("body".into(), r#"{"name":"a"}"#.into()),
                ("note".into(), "x".into()),
            ],
            files: Vec::new(),
        };
        let err = load(&multipart_endpoint(person()), DataTree::new(), Payload::Form(form)).unwrap_err();
        assert!(matches!(err, ApiError::MalformedMultipart(_)));
    }

    #[test]
    fn test_multipart_without_body_schema_keeps_files() {
        let form = FormData {
            fields: Vec::new(),
            files: vec![file()],
        };
        let loaded = load(&multipart_endpoint(Schema::new()), DataTree::new(), Payload::Form(form)).unwrap();
        assert!(loaded.data.is_empty());
        assert_eq!(loaded.files.len(), 1);
    }

    #[test]
    fn test_unsupported_shapes() {
        let text = EndpointDescriptor::builder(ApiMethod::Post)
            .request_type(Mime::Text)
            .build();
        assert!(matches!(
            load(&text, DataTree::new(), json_payload("{}")),
            Err(ApiError::UnsupportedRequestShape)
        ));
        assert!(matches!(
            load(&json_endpoint(), DataTree::new(), Payload::Form(FormData::default())),
            Err(ApiError::UnsupportedRequestShape)
        ));
    }
}
