//! Health checks, metrics, and monitoring endpoints.

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::instrument;

use crate::metrics::MetricsSnapshot;
use crate::state::AppState;

// ============================================================================
// Health Checks
// ============================================================================

/// GET /health - Basic health check
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /ready - Readiness check (verifies the layer registry loaded)
pub async fn ready_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    if state.registry.is_empty() {
        (StatusCode::SERVICE_UNAVAILABLE, "Not ready")
    } else {
        (StatusCode::OK, "Ready")
    }
}

// ============================================================================
// Prometheus Metrics
// ============================================================================

/// GET /metrics - Prometheus metrics endpoint
pub async fn metrics_handler(Extension(handle): Extension<PrometheusHandle>) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(handle.render().into())
        .unwrap()
}

// ============================================================================
// JSON Metrics API
// ============================================================================

/// GET /api/stats - JSON metrics snapshot
#[instrument(skip(state))]
pub async fn api_stats_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot().await)
}
