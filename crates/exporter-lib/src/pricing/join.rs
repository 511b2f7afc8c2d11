//! Record joining
//!
//! Cross-joins spot aggregates against on-demand catalog entries by
//! instance type and produces the unified price records consumed by the
//! exposition boundary. Spot aggregates with no matching catalog entry
//! are excluded from the output (they stay available as raw aggregates)
//! and counted.

use crate::models::{OnDemandCatalogEntry, PriceOption, PriceRecord, SpotAggregate};
use crate::pricing::{on_demand_unit_price, spot_economics};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Spot records always carry an hourly unit; the catalog unit only
/// applies to on-demand records
const SPOT_UNIT: &str = "Hrs";

/// Unified price records plus join bookkeeping
#[derive(Debug, Default)]
pub struct JoinResult {
    pub records: Vec<PriceRecord>,
    /// Spot aggregates without a matching on-demand entry
    pub unmatched_spot: usize,
    /// Records dropped because unit price decomposition failed
    pub degenerate: usize,
}

/// Build the unified price record set from on-demand entries, spot
/// aggregates and the set of instance types currently in use.
pub fn build_price_records(
    entries: &[OnDemandCatalogEntry],
    aggregates: &[SpotAggregate],
    in_use: &HashSet<String>,
) -> JoinResult {
    let mut result = JoinResult::default();

    let mut by_type: HashMap<&str, Vec<&OnDemandCatalogEntry>> = HashMap::new();
    for entry in entries {
        by_type.entry(entry.instance_type.as_str()).or_default().push(entry);
    }

    for entry in entries {
        match on_demand_unit_price(entry) {
            Ok(unit) => {
                result.records.push(PriceRecord {
                    instance_type: entry.instance_type.clone(),
                    option: PriceOption::OnDemand,
                    cpu: entry.vcpu.clone(),
                    memory: entry.memory.clone(),
                    unit: entry.unit.clone(),
                    az: String::new(),
                    hourly_price: entry.price_per_hour,
                    cpu_price: unit.cpu_price,
                    mem_price: unit.mem_price,
                    capacity: None,
                    discount: None,
                    in_use: in_use.contains(&entry.instance_type),
                });
            }
            Err(err) => {
                result.degenerate += 1;
                debug!(
                    instance_type = %entry.instance_type,
                    error = %err,
                    "Dropping degenerate on-demand entry"
                );
            }
        }
    }

    for aggregate in aggregates {
        let Some(matches) = by_type.get(aggregate.instance_type.as_str()) else {
            result.unmatched_spot += 1;
            debug!(
                instance_type = %aggregate.instance_type,
                az = %aggregate.az,
                "Spot aggregate has no on-demand counterpart"
            );
            continue;
        };

        for entry in matches {
            match spot_economics(aggregate, entry) {
                Ok(economics) => {
                    result.records.push(PriceRecord {
                        instance_type: aggregate.instance_type.clone(),
                        option: PriceOption::Spot,
                        cpu: entry.vcpu.clone(),
                        memory: entry.memory.clone(),
                        unit: SPOT_UNIT.to_string(),
                        az: aggregate.az.clone(),
                        hourly_price: aggregate.mean_price,
                        cpu_price: economics.unit_price.cpu_price,
                        mem_price: economics.unit_price.mem_price,
                        capacity: Some(economics.capacity),
                        discount: Some(economics.discount),
                        in_use: in_use.contains(&aggregate.instance_type),
                    });
                }
                Err(err) => {
                    result.degenerate += 1;
                    debug!(
                        instance_type = %aggregate.instance_type,
                        az = %aggregate.az,
                        error = %err,
                        "Dropping degenerate spot record"
                    );
                }
            }
        }
    }

    result
}
