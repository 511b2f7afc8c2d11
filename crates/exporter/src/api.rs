//! HTTP API for health checks, Prometheus metrics and manual refresh

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use exporter_lib::{
    health::{ComponentStatus, HealthRegistry},
    observability::render_snapshot,
    CycleOutcome, Engine,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(engine: Arc<Engine>, health_registry: HealthRegistry) -> Self {
        Self {
            engine,
            health_registry,
        }
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
///
/// Renders the published snapshot into gauges on a throwaway registry,
/// then appends the process-global engine counters.
async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.engine.snapshot().await;

    let registry = match render_snapshot(&snapshot) {
        Ok(registry) => registry,
        Err(err) => {
            error!(error = %err, "Failed to render snapshot");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain; charset=utf-8")],
                Vec::new(),
            );
        }
    };

    let mut metric_families = registry.gather();
    metric_families.extend(prometheus::gather());

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %err, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Manual recompute trigger - 409 when a cycle is already in flight
async fn refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.engine.recompute().await {
        Ok(CycleOutcome::Completed(stats)) => (StatusCode::OK, Json(json!(stats))),
        Ok(CycleOutcome::Skipped) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "recompute already in flight" })),
        ),
        Err(err) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": err.to_string() })),
        ),
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/refresh", post(refresh))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
