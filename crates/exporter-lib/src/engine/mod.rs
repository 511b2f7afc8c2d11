//! Recompute engine
//!
//! Owns the cycle that pulls raw records from the providers, runs the
//! pricing and carbon pipelines, and publishes the resulting snapshot
//! atomically. Cycles are serialized: a trigger arriving while a cycle
//! is in flight is skipped, never queued.

mod cycle;
mod providers;
mod snapshot;

pub use cycle::{CycleOutcome, CycleStats, Engine, EngineConfig};
pub use providers::{
    CatalogProvider, Providers, ReferenceProvider, SpotPriceProvider, UsageProvider,
};
pub use snapshot::Snapshot;
