//! Integration tests for the exporter API endpoints

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use exporter_lib::{
    carbon::{MachineRow, RegionRow},
    engine::{CatalogProvider, ReferenceProvider, SpotPriceProvider, UsageProvider},
    health::{components, ComponentStatus, HealthRegistry},
    observability::render_snapshot,
    CycleOutcome, Engine, EngineConfig, NodeUsageSample, PriceObservation, ProviderError,
    Providers, UsageSnapshot,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub health_registry: HealthRegistry,
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;
    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;
    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(readiness))
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.engine.snapshot().await;
    let registry = render_snapshot(&snapshot).unwrap();

    let mut metric_families = registry.gather();
    metric_families.extend(prometheus::gather());

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

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

fn create_test_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/refresh", post(refresh))
        .with_state(state)
}

/// In-memory feeds serving one instance type in one AZ
struct StaticFeeds {
    spot_fail: bool,
}

#[async_trait]
impl SpotPriceProvider for StaticFeeds {
    async fn spot_price_history(
        &self,
        _lookback: Duration,
    ) -> Result<Vec<PriceObservation>, ProviderError> {
        if self.spot_fail {
            return Err(ProviderError::Transient("spot feed down".to_string()));
        }
        Ok(vec![PriceObservation {
            instance_type: "t2.micro".to_string(),
            az: "eu-west-1a".to_string(),
            price: "1.60".to_string(),
            timestamp: 1_700_000_000,
        }])
    }
}

#[async_trait]
impl CatalogProvider for StaticFeeds {
    async fn on_demand_catalog(&self) -> Result<Vec<serde_json::Value>, ProviderError> {
        Ok(vec![json!({
            "product": {
                "attributes": {
                    "instanceType": "t2.micro",
                    "vcpu": "2",
                    "memory": "8 GiB"
                }
            },
            "terms": {
                "OnDemand": {
                    "offer1": {
                        "priceDimensions": {
                            "dim1": {
                                "unit": "Hrs",
                                "description": "On demand",
                                "pricePerUnit": { "USD": "2.00" }
                            }
                        }
                    }
                }
            }
        })])
    }
}

#[async_trait]
impl ReferenceProvider for StaticFeeds {
    async fn machine_rows(&self) -> Result<Vec<MachineRow>, ProviderError> {
        Ok(vec![MachineRow {
            machine_type: "t2.micro".to_string(),
            vcpu: "2".to_string(),
            memory_gib: "8".to_string(),
            cpu_idle: "5".to_string(),
            cpu_at10: "10".to_string(),
            cpu_at50: "15".to_string(),
            cpu_at100: "20".to_string(),
            mem_idle: "2".to_string(),
            mem_at10: "4".to_string(),
            mem_at50: "6".to_string(),
            mem_at100: "8".to_string(),
            embodied_carbon: "9.5".to_string(),
        }])
    }

    async fn region_rows(&self) -> Result<Vec<RegionRow>, ProviderError> {
        Ok(vec![RegionRow {
            region: "eu-west-1".to_string(),
            carbon_intensity: "300".to_string(),
            pue: "1.2".to_string(),
        }])
    }
}

#[async_trait]
impl UsageProvider for StaticFeeds {
    async fn usage_snapshot(&self) -> Result<UsageSnapshot, ProviderError> {
        Ok(UsageSnapshot {
            nodes: vec![NodeUsageSample {
                name: "node-a".to_string(),
                machine_type: "t2.micro".to_string(),
                region: "eu-west-1".to_string(),
                cpu_usage_percent: 30.0,
                mem_usage_percent: 30.0,
            }],
            pods: vec![],
        })
    }
}

async fn setup_test_app(spot_fail: bool) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::SPOT_PRICES).await;
    health_registry.register(components::CATALOG).await;
    health_registry.register(components::REFERENCE).await;
    health_registry.register(components::USAGE).await;

    let feeds = Arc::new(StaticFeeds { spot_fail });
    let engine = Arc::new(Engine::new(
        Providers {
            spot: feeds.clone(),
            catalog: feeds.clone(),
            reference: feeds.clone(),
            usage: feeds,
        },
        EngineConfig::default(),
        health_registry.clone(),
    ));

    let state = Arc::new(AppState {
        engine,
        health_registry,
    });
    let router = create_test_router(state.clone());

    (router, state)
}

async fn get_body(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state) = setup_test_app(false).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let health: serde_json::Value = serde_json::from_str(&get_body(response).await).unwrap();
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["spot_prices"].is_object());
    assert!(health["components"]["catalog"].is_object());
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_test_app(false).await;

    state
        .health_registry
        .set_unhealthy(components::SPOT_PRICES, "Feed unreachable")
        .await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let health: serde_json::Value = serde_json::from_str(&get_body(response).await).unwrap();
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_returns_503_when_not_ready() {
    let (app, _state) = setup_test_app(false).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_readyz_returns_ok_when_ready() {
    let (app, state) = setup_test_app(false).await;

    state.health_registry.set_ready(true).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let readiness: serde_json::Value = serde_json::from_str(&get_body(response).await).unwrap();
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_refresh_publishes_metrics() {
    let (app, _state) = setup_test_app(false).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let stats: serde_json::Value = serde_json::from_str(&get_body(response).await).unwrap();
    assert_eq!(stats["price_records"], 2);
    assert_eq!(stats["node_records"], 1);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let metrics_text = get_body(response).await;

    assert!(metrics_text.contains("instance_cost_all"));
    assert!(metrics_text.contains("instance_cpu_price"));
    assert!(metrics_text.contains(r#"option="SPOT""#));
    assert!(metrics_text.contains(r#"option="ON_DEMAND""#));
    assert!(metrics_text.contains("co2_node"));
    assert!(metrics_text.contains("watt_node"));
    // Spot discount for 1.60 against 2.00 on demand
    assert!(metrics_text.contains("instance_discount"));
}

#[tokio::test]
async fn test_metrics_before_first_cycle_serves_engine_counters_only() {
    let (app, _state) = setup_test_app(false).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let metrics_text = get_body(response).await;

    // Snapshot gauges have no samples yet; the engine counters are global
    assert!(!metrics_text.contains(r#"instance_cost_all{"#));
    assert!(metrics_text.contains("cost_exporter_"));
}

#[tokio::test]
async fn test_refresh_returns_502_when_feed_fails() {
    let (app, _state) = setup_test_app(true).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body: serde_json::Value = serde_json::from_str(&get_body(response).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("spot feed down"));
}
