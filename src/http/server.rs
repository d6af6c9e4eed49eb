//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a catch-all API handler
//! - Wire up middleware (tracing, timeout, request ID, CORS headers)
//! - Bind server to listener
//! - Resolve endpoints and hand requests to the dispatcher
//! - Swap the endpoint table on config reload
//! - Observability (metrics, correlation IDs)

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ConfigError, ServerConfig};
use crate::dispatch::{
    Authenticator, Dispatch, DispatchSettings, Dispatcher, MemoryQuotaStore, QuotaStore,
    StaticAuthenticator,
};
use crate::endpoint::Mime;
use crate::error::ApiError;
use crate::observability::metrics;
use crate::request::TransportRequest;
use crate::routing::EndpointRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<ArcSwap<EndpointRouter>>,
    pub dispatcher: Dispatcher,
}

/// HTTP server for the API.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    routes: Arc<ArcSwap<EndpointRouter>>,
}

impl HttpServer {
    /// Create a server with the static authenticator and in-memory quota store.
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        let endpoints = EndpointRouter::from_config(&config.endpoints)?;
        let auth = Arc::new(StaticAuthenticator::from_config(&config.auth));
        let quota = Arc::new(MemoryQuotaStore::with_rate_limit(config.quota.rate_limit));
        Ok(Self::with_parts(config, endpoints, auth, quota))
    }

    /// Create a server around caller-supplied endpoints and stores.
    pub fn with_parts(
        config: ServerConfig,
        endpoints: EndpointRouter,
        auth: Arc<dyn Authenticator>,
        quota: Arc<dyn QuotaStore>,
    ) -> Self {
        let routes = Arc::new(ArcSwap::from_pointee(endpoints));
        let dispatcher = Dispatcher::new(
            auth,
            quota,
            DispatchSettings {
                rate_window_secs: config.quota.rate_window_secs,
                max_body_size: config.security.max_body_size,
            },
        );

        let state = AppState {
            routes: routes.clone(),
            dispatcher,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            routes,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(api_handler))
            .route("/", any(api_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("POST, GET, OPTIONS"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Content-Type, Auth-Token"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_MAX_AGE,
                HeaderValue::from_static("600"),
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id,
                    )
                }),
            )
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the live endpoint table.
    pub fn routes(&self) -> Arc<ArcSwap<EndpointRouter>> {
        self.routes.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Tables arriving on `endpoint_updates` replace the endpoint table.
    pub async fn run(
        self,
        listener: TcpListener,
        mut endpoint_updates: mpsc::UnboundedReceiver<EndpointRouter>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let routes = self.routes.clone();
        tokio::spawn(async move {
            while let Some(table) = endpoint_updates.recv().await {
                let endpoints = table.len();
                routes.store(Arc::new(table));
                tracing::info!(endpoints, "Endpoint table swapped");
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Resolves the endpoint, dispatches, and runs its handler.
async fn api_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request = TransportRequest::from_http(request);
    let method = request.method.to_string();

    let routes = state.routes.load_full();
    let Some(route) = routes.match_path(&request.path).cloned() else {
        tracing::warn!(path = %request.path, "Unknown endpoint");
        let err = ApiError::UnknownEndpoint(request.path);
        metrics::record_rejection(err.kind());
        metrics::record_request(metrics::UNKNOWN_ENDPOINT, &method, 404, start);
        return err.into_response_as(None);
    };
    drop(routes);

    tracing::debug!(endpoint = %route.path, method = %method, "Dispatching request");
    let response_type = route.descriptor.response_type();
    let response = match state.dispatcher.handle(route.descriptor.clone(), request).await {
        Ok(Dispatch::Preflight) => StatusCode::NO_CONTENT.into_response(),
        Ok(Dispatch::Proceed(ctx)) => match (route.handler)(ctx).await {
            Ok(response) => response,
            Err(e) => reject(e, response_type),
        },
        Err(e) => reject(e, response_type),
    };

    metrics::record_request(&route.path, &method, response.status().as_u16(), start);
    response
}

fn reject(err: ApiError, response_type: Mime) -> Response {
    metrics::record_rejection(err.kind());
    if matches!(err, ApiError::RateLimited) {
        metrics::record_rate_limited();
    }
    tracing::debug!(kind = err.kind(), error = %err, "Request rejected");
    err.into_response_as(Some(response_type))
}
