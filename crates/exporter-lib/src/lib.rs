//! Core library for the fleet cost and carbon exporter
//!
//! This crate provides the core functionality for:
//! - Spot price aggregation and on-demand catalog normalization
//! - Unit price decomposition, discount and spare-capacity estimates
//! - Power modelling and CO2 estimation for nodes and pods
//! - The recompute engine that publishes immutable snapshots
//! - Health checks and observability

pub mod carbon;
pub mod engine;
pub mod errors;
pub mod health;
pub mod models;
pub mod observability;
pub mod pricing;

pub use engine::{CycleOutcome, CycleStats, Engine, EngineConfig, Providers, Snapshot};
pub use errors::{ParseError, ProviderError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{render_snapshot, EngineMetrics};
