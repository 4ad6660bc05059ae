//! HTTP server exposing the Prometheus scrape endpoint.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::collector::CollectorRegistry;
use crate::exposition;

/// Default path of the scrape endpoint.
pub const METRICS_PATH: &str = "/metrics";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CollectorRegistry>,
    pub metrics_path: String,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    collectors: usize,
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(&state.metrics_path, get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .with_state(state)
}

/// Liveness probe.
async fn healthz_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        collectors: state.registry.len(),
    })
}

/// Scrape handler: collects every target and renders the text exposition.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let families = state.registry.gather().await;

    match exposition::render(&families) {
        Ok(body) => (
            [(header::CONTENT_TYPE, exposition::content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error: {}", e),
            )
                .into_response()
        }
    }
}
