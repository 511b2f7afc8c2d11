//! Recompute cycle orchestration
//!
//! One cycle fetches every upstream feed, runs the pricing and carbon
//! pipelines and publishes a fresh `Snapshot` in a single atomic swap.
//! Readers always see either the previous complete snapshot or the new
//! one, never a half-updated mix. Cycles are serialized: a trigger that
//! arrives while one is in flight is dropped, not queued.

use crate::carbon::{estimate, ReferenceData};
use crate::engine::providers::Providers;
use crate::engine::snapshot::Snapshot;
use crate::errors::ProviderError;
use crate::health::{components, HealthRegistry};
use crate::observability::EngineMetrics;
use crate::pricing::{aggregate_spot_prices, build_price_records, normalize_catalog_page};
use chrono::Utc;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// Engine tuning knobs
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Region label stamped onto every published price record
    pub region: String,
    /// Spot price history window
    pub lookback: Duration,
    /// Per-provider-call deadline
    pub call_timeout: Duration,
    /// Time between scheduled recomputes
    pub refresh_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            region: "eu-west-1".to_string(),
            lookback: Duration::from_secs(24 * 60 * 60),
            call_timeout: Duration::from_secs(30),
            refresh_interval: Duration::from_secs(12 * 60 * 60),
        }
    }
}

/// Counters from one completed cycle
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct CycleStats {
    pub price_records: usize,
    pub node_records: usize,
    pub pod_records: usize,
    /// Records dropped as unparsable across all pipeline stages
    pub skipped_parse: usize,
    /// Spot aggregates with no matching on-demand catalog entry
    pub unmatched_spot: usize,
    /// Carbon lookups that fell back to zero-valued profiles
    pub lookup_misses: usize,
}

/// Result of a recompute trigger
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// A new snapshot was published
    Completed(CycleStats),
    /// Another cycle was already in flight; nothing happened
    Skipped,
}

/// The recompute engine: owns the providers, the published snapshot and
/// the cycle gate.
pub struct Engine {
    providers: Providers,
    config: EngineConfig,
    health: HealthRegistry,
    metrics: EngineMetrics,
    published: RwLock<Arc<Snapshot>>,
    cycle_gate: Mutex<()>,
}

impl Engine {
    pub fn new(providers: Providers, config: EngineConfig, health: HealthRegistry) -> Self {
        let empty = Arc::new(Snapshot::empty(config.region.clone()));
        Self {
            providers,
            config,
            health,
            metrics: EngineMetrics::new(),
            published: RwLock::new(empty),
            cycle_gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The most recently published snapshot. Cheap to call; readers
    /// share the snapshot behind an `Arc`.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.published.read().await.clone()
    }

    /// Run one full recompute cycle, unless one is already in flight.
    pub async fn recompute(&self) -> Result<CycleOutcome, ProviderError> {
        let _gate = match self.cycle_gate.try_lock() {
            Ok(gate) => gate,
            Err(_) => {
                self.metrics.cycle_skipped();
                warn!("Recompute already in flight, skipping trigger");
                return Ok(CycleOutcome::Skipped);
            }
        };

        let started = Instant::now();
        match self.run_cycle().await {
            Ok(stats) => {
                let elapsed = started.elapsed();
                self.metrics.cycle_completed(elapsed.as_secs_f64());
                info!(
                    price_records = stats.price_records,
                    node_records = stats.node_records,
                    pod_records = stats.pod_records,
                    skipped_parse = stats.skipped_parse,
                    unmatched_spot = stats.unmatched_spot,
                    lookup_misses = stats.lookup_misses,
                    elapsed_ms = elapsed.as_millis(),
                    "Recompute cycle complete"
                );
                Ok(CycleOutcome::Completed(stats))
            }
            Err(err) => {
                self.metrics.cycle_failed();
                error!(error = %err, "Recompute cycle failed, keeping previous snapshot");
                Err(err)
            }
        }
    }

    /// Await a provider call under the configured deadline, recording
    /// the outcome against the named health component.
    async fn fetch<T, F>(&self, component: &str, call: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.config.call_timeout, call).await {
            Ok(Ok(value)) => {
                self.health.set_healthy(component).await;
                Ok(value)
            }
            Ok(Err(err)) => {
                self.health.set_unhealthy(component, err.to_string()).await;
                Err(err)
            }
            Err(_) => {
                let err = ProviderError::Transient(format!(
                    "{component} call exceeded {}s deadline",
                    self.config.call_timeout.as_secs()
                ));
                self.health.set_unhealthy(component, err.to_string()).await;
                Err(err)
            }
        }
    }

    /// Fetch both reference tables concurrently. Either failure aborts
    /// the cycle; a partial reference load is never used.
    async fn fetch_reference(&self) -> Result<ReferenceData, ProviderError> {
        let (machines, regions) = tokio::join!(
            self.fetch(
                components::REFERENCE,
                self.providers.reference.machine_rows()
            ),
            self.fetch(components::REFERENCE, self.providers.reference.region_rows()),
        );
        Ok(ReferenceData::from_rows(&machines?, &regions?))
    }

    async fn run_cycle(&self) -> Result<CycleStats, ProviderError> {
        let reference = self.fetch_reference().await?;
        let observations = self
            .fetch(
                components::SPOT_PRICES,
                self.providers.spot.spot_price_history(self.config.lookback),
            )
            .await?;
        let payloads = self
            .fetch(components::CATALOG, self.providers.catalog.on_demand_catalog())
            .await?;
        let usage = self
            .fetch(components::USAGE, self.providers.usage.usage_snapshot())
            .await?;

        let aggregation = aggregate_spot_prices(&observations);
        let normalization = normalize_catalog_page(&payloads);

        // Instance types backing current nodes count as in use
        let in_use: HashSet<String> = usage
            .nodes
            .iter()
            .map(|node| node.machine_type.clone())
            .collect();

        let join = build_price_records(&normalization.entries, &aggregation.aggregates, &in_use);
        let carbon = estimate(&usage, &reference);

        let stats = CycleStats {
            price_records: join.records.len(),
            node_records: carbon.nodes.len(),
            pod_records: carbon.pods.len(),
            skipped_parse: aggregation.skipped
                + normalization.skipped
                + join.degenerate
                + reference.skipped_rows,
            unmatched_spot: join.unmatched_spot,
            lookup_misses: carbon.lookup_misses,
        };

        self.metrics.add_skipped("parse", stats.skipped_parse);
        self.metrics.add_skipped("no_match", stats.unmatched_spot);
        self.metrics.add_skipped("lookup_miss", stats.lookup_misses);

        let snapshot = Snapshot {
            region: self.config.region.clone(),
            price_records: join.records,
            node_records: carbon.nodes,
            pod_records: carbon.pods,
            computed_at: Some(Utc::now()),
        };
        *self.published.write().await = Arc::new(snapshot);

        Ok(stats)
    }

    /// Periodic recompute loop. The first scheduled tick fires one
    /// full interval after startup; the initial recompute is expected
    /// to have been triggered by the caller.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.config.refresh_interval.as_secs(),
            "Starting recompute loop"
        );

        let mut ticker = interval(self.config.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval() fires immediately; consume the startup tick
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.recompute().await {
                        error!(error = %err, "Scheduled recompute failed");
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutting down recompute loop");
                    break;
                }
            }
        }
    }
}
