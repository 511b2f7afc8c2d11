//! Observability for the exporter
//!
//! Two concerns live here:
//! - rendering a published snapshot into the stable, label-addressed
//!   gauge set that downstream scrapers depend on (names and label sets
//!   are a compatibility contract), and
//! - the engine's own metrics (skip counters, cycle timings), registered
//!   once against the default registry.

use crate::engine::Snapshot;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    GaugeVec, Histogram, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::OnceLock;

const COST_LABELS: [&str; 7] = [
    "instance_type",
    "option",
    "cpu",
    "memory",
    "unit",
    "az",
    "region",
];
const UNIT_LABELS: [&str; 5] = ["instance_type", "option", "unit", "az", "region"];
const NODE_LABELS: [&str; 3] = ["name", "region", "machine_type"];
const POD_LABELS: [&str; 2] = ["name", "region"];

/// Render a snapshot into a fresh registry.
///
/// A new registry per publish keeps stale series from an earlier cycle
/// out of the exposition; consumers always see one complete snapshot.
pub fn render_snapshot(snapshot: &Snapshot) -> Result<Registry, prometheus::Error> {
    let registry = Registry::new();

    let gauge = |name: &str, help: &str, labels: &[&str]| -> Result<GaugeVec, prometheus::Error> {
        let vec = GaugeVec::new(Opts::new(name, help), labels)?;
        registry.register(Box::new(vec.clone()))?;
        Ok(vec)
    };

    let cost_all = gauge(
        "instance_cost_all",
        "Hourly price for every known instance type",
        &COST_LABELS,
    )?;
    let cost_in_use = gauge(
        "instance_cost",
        "Hourly price for instance types currently in use",
        &COST_LABELS,
    )?;
    let cpu_price = gauge(
        "instance_cpu_price",
        "Price attributed to one vCPU",
        &UNIT_LABELS,
    )?;
    let mem_price = gauge(
        "instance_mem_price",
        "Price attributed to one GiB of memory",
        &UNIT_LABELS,
    )?;
    let capacity = gauge(
        "instance_capacity",
        "Estimated spare spot capacity fraction",
        &UNIT_LABELS,
    )?;
    let discount = gauge(
        "instance_discount",
        "Spot discount fraction against on-demand",
        &UNIT_LABELS,
    )?;
    let co2_node = gauge("co2_node", "Grams CO2 emitted by a node", &NODE_LABELS)?;
    let watt_node = gauge("watt_node", "Power draw of a node in watts", &NODE_LABELS)?;
    let co2_pod = gauge("co2_pod", "Grams CO2 attributed to a pod", &POD_LABELS)?;
    let watt_pod = gauge("watt_pod", "Power draw attributed to a pod in watts", &POD_LABELS)?;

    let region = snapshot.region.as_str();

    for record in &snapshot.price_records {
        let option = record.option.as_label();
        let cost_labels = [
            record.instance_type.as_str(),
            option,
            record.cpu.as_str(),
            record.memory.as_str(),
            record.unit.as_str(),
            record.az.as_str(),
            region,
        ];
        let unit_labels = [
            record.instance_type.as_str(),
            option,
            record.unit.as_str(),
            record.az.as_str(),
            region,
        ];

        cost_all.with_label_values(&cost_labels).set(record.hourly_price);
        if record.in_use {
            cost_in_use.with_label_values(&cost_labels).set(record.hourly_price);
        }
        cpu_price.with_label_values(&unit_labels).set(record.cpu_price);
        mem_price.with_label_values(&unit_labels).set(record.mem_price);
        if let Some(value) = record.capacity {
            capacity.with_label_values(&unit_labels).set(value);
        }
        if let Some(value) = record.discount {
            discount.with_label_values(&unit_labels).set(value);
        }
    }

    for record in &snapshot.node_records {
        let labels = [
            record.name.as_str(),
            record.region.as_str(),
            record.machine_type.as_str(),
        ];
        co2_node.with_label_values(&labels).set(record.co2);
        watt_node.with_label_values(&labels).set(record.watt);
    }

    for record in &snapshot.pod_records {
        let labels = [record.name.as_str(), record.region.as_str()];
        co2_pod.with_label_values(&labels).set(record.co2);
        watt_pod.with_label_values(&labels).set(record.watt);
    }

    Ok(registry)
}

/// Cycle duration buckets in seconds
const CYCLE_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Global engine metrics (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

struct EngineMetricsInner {
    records_skipped: IntCounterVec,
    cycles_completed: IntCounter,
    cycles_failed: IntCounter,
    cycles_skipped: IntCounter,
    cycle_duration_seconds: Histogram,
    last_success_timestamp: IntGauge,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            records_skipped: register_int_counter_vec!(
                "cost_exporter_records_skipped_total",
                "Records dropped during a recompute cycle, by reason",
                &["reason"]
            )
            .expect("Failed to register records_skipped_total"),

            cycles_completed: register_int_counter!(
                "cost_exporter_cycles_completed_total",
                "Recompute cycles that published a snapshot"
            )
            .expect("Failed to register cycles_completed_total"),

            cycles_failed: register_int_counter!(
                "cost_exporter_cycles_failed_total",
                "Recompute cycles aborted by a provider failure"
            )
            .expect("Failed to register cycles_failed_total"),

            cycles_skipped: register_int_counter!(
                "cost_exporter_cycles_skipped_total",
                "Recompute triggers skipped because a cycle was in flight"
            )
            .expect("Failed to register cycles_skipped_total"),

            cycle_duration_seconds: register_histogram!(
                "cost_exporter_cycle_duration_seconds",
                "Wall time of a full recompute cycle",
                CYCLE_BUCKETS.to_vec()
            )
            .expect("Failed to register cycle_duration_seconds"),

            last_success_timestamp: register_int_gauge!(
                "cost_exporter_last_success_timestamp_seconds",
                "Unix timestamp of the last published snapshot"
            )
            .expect("Failed to register last_success_timestamp_seconds"),
        }
    }
}

/// Handle to the engine's own metrics; clones share the global instance
#[derive(Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Count records dropped for a reason ("parse", "lookup_miss", "no_match")
    pub fn add_skipped(&self, reason: &str, count: usize) {
        if count > 0 {
            self.inner()
                .records_skipped
                .with_label_values(&[reason])
                .inc_by(count as u64);
        }
    }

    pub fn cycle_completed(&self, duration_secs: f64) {
        let inner = self.inner();
        inner.cycles_completed.inc();
        inner.cycle_duration_seconds.observe(duration_secs);
        inner
            .last_success_timestamp
            .set(chrono::Utc::now().timestamp());
    }

    pub fn cycle_failed(&self) {
        self.inner().cycles_failed.inc();
    }

    pub fn cycle_skipped(&self) {
        self.inner().cycles_skipped.inc();
    }
}
