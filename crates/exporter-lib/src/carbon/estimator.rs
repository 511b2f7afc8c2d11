//! Carbon estimation
//!
//! Combines node power draw with regional PUE and carbon intensity plus a
//! per-machine embodied-carbon factor into node records, then apportions
//! node power to pods by their reported usage. Unknown machine types or
//! regions fall back to zero-valued profiles: the entity gets watt = 0
//! and co2 = 0 and the rest of the batch keeps going.

use crate::carbon::power::MachineProfile;
use crate::carbon::reference::{ReferenceData, RegionProfile};
use crate::models::{NodeCarbonRecord, PodCarbonRecord, UsageSnapshot};
use std::collections::HashMap;
use tracing::debug;

/// Millicores per core; unit-conversion constant, part of the contract
pub const MILLICORES_PER_CORE: f64 = 1_000.0;

/// Bytes per gigabyte; unit-conversion constant, part of the contract
pub const BYTES_PER_GB: f64 = 1e9;

/// Grams CO2 for a power draw in a region, plus the embodied share.
///
/// The embodied factor is time-independent manufacturing carbon; callers
/// pass it once per node record and 0.0 for pod records.
pub fn co2(watt: f64, embodied: f64, region: &RegionProfile) -> f64 {
    (watt / 1000.0) * region.pue * region.carbon_intensity + embodied
}

/// Node and pod carbon records for one usage batch
#[derive(Debug, Default)]
pub struct CarbonBatch {
    pub nodes: Vec<NodeCarbonRecord>,
    pub pods: Vec<PodCarbonRecord>,
    /// Machine-type, region or node lookups that fell back to zero values
    pub lookup_misses: usize,
}

/// Estimate watt and CO2 records for every node and pod in the batch
pub fn estimate(usage: &UsageSnapshot, reference: &ReferenceData) -> CarbonBatch {
    let mut batch = CarbonBatch::default();

    let fallback_machine = MachineProfile::default();
    let fallback_region = RegionProfile::default();
    let mut region_by_node: HashMap<String, RegionProfile> = HashMap::new();

    for node in &usage.nodes {
        let machine = match reference.machine(&node.machine_type) {
            Some(profile) => profile,
            None => {
                batch.lookup_misses += 1;
                debug!(node = %node.name, machine_type = %node.machine_type, "Unknown machine type, using zero-valued profile");
                &fallback_machine
            }
        };
        let region = match reference.region(&node.region) {
            Some(profile) => profile,
            None => {
                batch.lookup_misses += 1;
                debug!(node = %node.name, region = %node.region, "Unknown region, using zero-valued profile");
                &fallback_region
            }
        };

        let watt = machine.node_watt(node.cpu_usage_percent, node.mem_usage_percent);
        region_by_node.insert(node.name.clone(), region.clone());

        batch.nodes.push(NodeCarbonRecord {
            name: node.name.clone(),
            region: node.region.clone(),
            machine_type: node.machine_type.clone(),
            watt,
            co2: co2(watt, machine.embodied_carbon, region),
            per_unit_cpu_watt: machine.per_unit_cpu_watt(node.cpu_usage_percent),
            per_unit_mem_watt: machine.per_unit_mem_watt(node.mem_usage_percent),
        });
    }

    let nodes_by_name: HashMap<&str, &NodeCarbonRecord> =
        batch.nodes.iter().map(|n| (n.name.as_str(), n)).collect();

    let fallback_node = NodeCarbonRecord::default();
    let mut pods = Vec::with_capacity(usage.pods.len());

    for pod in &usage.pods {
        let node = match nodes_by_name.get(pod.node.as_str()) {
            Some(record) => *record,
            None => {
                batch.lookup_misses += 1;
                debug!(pod = %pod.name, node = %pod.node, "Pod references unknown node");
                &fallback_node
            }
        };
        // Reuse the profile resolved (and, on a miss, already counted)
        // for the node; an orphan pod keeps the zero-valued fallback.
        let region = region_by_node
            .get(pod.node.as_str())
            .cloned()
            .unwrap_or_default();

        let watt = (pod.cpu_usage_millicores / MILLICORES_PER_CORE) * node.per_unit_cpu_watt
            + (pod.mem_usage_bytes / BYTES_PER_GB) * node.per_unit_mem_watt;

        pods.push(PodCarbonRecord {
            name: pod.name.clone(),
            region: node.region.clone(),
            watt,
            co2: co2(watt, 0.0, &region),
        });
    }

    batch.pods = pods;
    batch
}
