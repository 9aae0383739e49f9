//! Vitrina storefront library.
//!
//! Server-rendered storefront and back-office over the Vitrina REST backend.
//! The binary in `main.rs` only loads configuration, sets up tracing and
//! Sentry, and serves the router built by [`build_app`]; everything else
//! lives here so it can be driven by the integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use std::path::Path;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::config::ConfigError;
use crate::state::AppState;

/// Build the full application router with every middleware layer.
///
/// # Errors
///
/// Returns an error if the session signing key cannot be derived from the
/// configured secret.
pub fn build_app(state: AppState) -> Result<Router, ConfigError> {
    let session_layer = middleware::create_session_layer(state.config())?;
    let static_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("static");

    let app = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes(state.config().rate_limit))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(from_fn(middleware::session_expiry_middleware))
        .layer(session_layer)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::security_headers_middleware,
        ))
        .layer(from_fn(middleware::csp_nonce_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    Ok(app)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the backend does not answer its own
/// health check.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.backend().health().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
