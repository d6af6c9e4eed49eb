//! Built-in business handlers bound to endpoints by name.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::response::Response;
use serde_json::{json, Map, Value};

use crate::dispatch::RequestContext;
use crate::error::ApiError;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response, ApiError>> + Send>>;

/// Business logic run after a request was dispatched.
pub type Handler = Arc<dyn Fn(RequestContext) -> HandlerFuture + Send + Sync>;

/// Names accepted in `endpoints[].handler`.
pub const BUILTIN_HANDLERS: &[&str] = &["ping", "echo", "whoami", "upload", "text"];

/// Wrap an async function as a `Handler`.
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, ApiError>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_HANDLERS.contains(&name)
}

pub fn builtin(name: &str) -> Option<Handler> {
    match name {
        "ping" => Some(handler(ping)),
        "echo" => Some(handler(echo)),
        "whoami" => Some(handler(whoami)),
        "upload" => Some(handler(upload)),
        "text" => Some(handler(text)),
        _ => None,
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

async fn ping(mut ctx: RequestContext) -> Result<Response, ApiError> {
    ctx.set_response(object(json!({ "pong": true })));
    ctx.send()
}

/// Returns the validated request data under `data`.
async fn echo(mut ctx: RequestContext) -> Result<Response, ApiError> {
    let data = Value::Object(ctx.data().clone());
    ctx.set_response(object(json!({ "data": data })));
    ctx.send()
}

async fn whoami(mut ctx: RequestContext) -> Result<Response, ApiError> {
    let body = object(json!({
        "user": ctx.user(),
        "session": ctx.session(),
    }));
    ctx.set_response(body);
    ctx.send()
}

/// Describes the uploaded files; contents are not echoed.
async fn upload(mut ctx: RequestContext) -> Result<Response, ApiError> {
    let files: Vec<Value> = ctx
        .files()
        .iter()
        .map(|file| {
            json!({
                "field": file.field,
                "name": file.file_name,
                "type": file.content_type,
                "size": file.size(),
            })
        })
        .collect();
    let data = Value::Object(ctx.data().clone());
    ctx.set_response(object(json!({ "files": files, "data": data })));
    ctx.send()
}

/// Plain-text greeting; mount on a `text/plain` endpoint.
async fn text(mut ctx: RequestContext) -> Result<Response, ApiError> {
    let greeting = format!("Hello, {}!", ctx.user().unwrap_or("anonymous"));
    ctx.set_response(greeting);
    ctx.send()
}
