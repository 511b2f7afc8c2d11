//! Core data models for the cost & carbon exporter

use serde::{Deserialize, Serialize};

/// A single spot price observation fetched from the provider history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceObservation {
    pub instance_type: String,
    pub az: String,
    /// Raw price string as delivered by the provider; parsed during aggregation
    pub price: String,
    pub timestamp: i64,
}

/// Mean spot price for one (instance type, availability zone) group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotAggregate {
    pub instance_type: String,
    pub az: String,
    pub mean_price: f64,
}

/// Flat on-demand pricing record extracted from a nested catalog payload.
///
/// Region-level: the on-demand catalog carries no availability zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnDemandCatalogEntry {
    pub instance_type: String,
    /// Raw vCPU attribute string, kept for record labels
    pub vcpu: String,
    /// Raw memory attribute string (e.g. "1 GiB"), kept for record labels
    pub memory: String,
    pub vcpu_count: u32,
    pub memory_gib: f64,
    pub price_per_hour: f64,
    pub unit: String,
    pub description: String,
}

/// Price attributed to one unit of a single resource dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPrice {
    pub instance_type: String,
    pub az: String,
    pub cpu_price: f64,
    pub mem_price: f64,
}

/// Spot unit prices plus the derived discount and spare-capacity estimates.
///
/// `capacity` and `discount` are not clamped to [0, 1]: a spot price below
/// the assumed floor or above the on-demand price produces values outside
/// that range, and those are valid model outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotEconomics {
    pub unit_price: UnitPrice,
    pub capacity: f64,
    pub discount: f64,
}

/// Node resource usage sample (percentages of node capacity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeUsageSample {
    pub name: String,
    pub machine_type: String,
    pub region: String,
    pub cpu_usage_percent: f64,
    pub mem_usage_percent: f64,
}

/// Pod resource usage sample (absolute millicores and bytes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodUsageSample {
    pub name: String,
    pub node: String,
    pub cpu_usage_millicores: f64,
    pub mem_usage_bytes: f64,
}

/// One batch of usage samples for the whole fleet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub nodes: Vec<NodeUsageSample>,
    pub pods: Vec<PodUsageSample>,
}

/// Purchase option discriminant for a price record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceOption {
    OnDemand,
    Spot,
}

impl PriceOption {
    /// Label value used on the exported records
    pub fn as_label(&self) -> &'static str {
        match self {
            PriceOption::OnDemand => "ON_DEMAND",
            PriceOption::Spot => "SPOT",
        }
    }
}

/// Unified cost output record for one instance type and purchase option
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRecord {
    pub instance_type: String,
    pub option: PriceOption,
    pub cpu: String,
    pub memory: String,
    pub unit: String,
    /// Empty for on-demand records; the catalog has no AZ dimension
    pub az: String,
    pub hourly_price: f64,
    pub cpu_price: f64,
    pub mem_price: f64,
    /// Spot records only
    pub capacity: Option<f64>,
    /// Spot records only
    pub discount: Option<f64>,
    /// True when the instance type appears in the current node usage samples
    pub in_use: bool,
}

/// Power and emissions output record for one node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeCarbonRecord {
    pub name: String,
    pub region: String,
    pub machine_type: String,
    pub watt: f64,
    pub co2: f64,
    /// Watts attributed to one vCPU at the node's current usage
    pub per_unit_cpu_watt: f64,
    /// Watts attributed to one GiB at the node's current usage
    pub per_unit_mem_watt: f64,
}

/// Power and emissions output record for one pod
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodCarbonRecord {
    pub name: String,
    pub region: String,
    pub watt: f64,
    pub co2: f64,
}
