//! End-to-end tests against a live server.

mod common;

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};

use api_dispatch::config::parse_config;
use api_dispatch::routing::EndpointRouter;
use common::*;

#[tokio::test]
async fn test_json_round_trip_over_tcp() {
    let server = spawn_server(test_config()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/echo?debug=1"))
        .json(&json!({"name": "a", "address": {"city": "Oslo"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST, "query keys are merged into the body before the strict check");

    let res = client
        .post(server.url("/api/echo"))
        .json(&json!({"name": "a", "address": {"city": "Oslo"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["address"]["city"], "Oslo");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_multipart_with_reqwest() {
    let server = spawn_server(test_config()).await;

    let file = reqwest::multipart::Part::bytes(b"GIF89a".to_vec())
        .file_name("pic.gif")
        .mime_str("image/gif")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .text("body", r#"{"title":"pic"}"#)
        .part("0", file);

    let res = reqwest::Client::new()
        .post(server.url("/api/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["files"][0]["name"], "pic.gif");
    assert_eq!(body["files"][0]["size"], 6);
    assert_eq!(body["data"]["title"], "pic");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_multipart_without_body_field() {
    let server = spawn_server(test_config()).await;

    let form = reqwest::multipart::Form::new().part(
        "0",
        reqwest::multipart::Part::bytes(b"x".to_vec()).file_name("x.bin"),
    );
    let res = reqwest::Client::new()
        .post(server.url("/api/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_endpoint_reload() {
    let server = spawn_server(test_config()).await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/api/extra")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let reloaded = parse_config(&format!(
        "{}\n[[endpoints]]\npath = \"/api/extra\"\nhandler = \"ping\"\n[endpoints.options]\nmethod = \"GET\"\nreq_auth = false\n",
        TEST_CONFIG
    ))
    .unwrap();
    let table = EndpointRouter::from_config(&reloaded.endpoints).unwrap();
    server.updates.send(table).unwrap();

    let mut status = StatusCode::NOT_FOUND;
    for _ in 0..50 {
        status = client.get(server.url("/api/extra")).send().await.unwrap().status();
        if status == StatusCode::OK {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status, StatusCode::OK);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let server = spawn_server(test_config()).await;
    let res = reqwest::get(server.url("/api/ping")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    drop(res);

    server.shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
