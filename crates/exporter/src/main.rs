//! Cost Exporter - fleet cost and carbon metrics exporter
//!
//! This binary aggregates spot price history, normalizes the on-demand
//! catalog, estimates node and pod power draw and CO2, and exposes the
//! results as Prometheus gauges.

use anyhow::Result;
use exporter_lib::{
    health::{components, HealthRegistry},
    Engine, Providers,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod providers;

const EXPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = EXPORTER_VERSION, "Starting cost-exporter");

    // Load configuration
    let config = config::ExporterConfig::load()?;
    info!(region = %config.region, data_dir = %config.data_dir, "Exporter configured");

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::SPOT_PRICES).await;
    health_registry.register(components::CATALOG).await;
    health_registry.register(components::REFERENCE).await;
    health_registry.register(components::USAGE).await;

    // Wire the file-backed feeds into the engine
    let feeds = Arc::new(providers::FileFeeds::new(config.data_dir.clone()));
    let engine = Arc::new(Engine::new(
        Providers {
            spot: feeds.clone(),
            catalog: feeds.clone(),
            reference: feeds.clone(),
            usage: feeds,
        },
        config.engine_config(),
        health_registry.clone(),
    ));

    // First recompute before serving; a failure is retried on schedule,
    // the exporter starts with an empty snapshot until then
    if let Err(err) = engine.recompute().await {
        error!(error = %err, "Initial recompute failed");
    }

    // Create shared application state
    let app_state = Arc::new(api::AppState::new(engine.clone(), health_registry.clone()));

    // Mark exporter as ready after initialization
    health_registry.set_ready(true).await;

    // Start the scheduled recompute loop and the API server
    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let engine_handle = tokio::spawn(engine.clone().run(shutdown_tx.subscribe()));
    let _api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("SIGINT received, shutting down");
    let _ = shutdown_tx.send(());
    let _ = engine_handle.await;

    Ok(())
}
