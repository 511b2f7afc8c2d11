//! Blended price decomposition and spot economics
//!
//! A blended hourly price is split into per-vCPU and per-GiB unit prices
//! using a fixed weighting constant, and a matching on-demand entry
//! turns a spot aggregate into discount and spare-capacity estimates.

use crate::errors::ParseError;
use crate::models::{OnDemandCatalogEntry, SpotAggregate, SpotEconomics, UnitPrice};

/// Assumed cost ratio of one vCPU to one GiB of memory
pub const CPU_MEM_WEIGHT: f64 = 7.2;

/// The deepest observed spot discount is assumed to be ~80%, so the spot
/// price floor is one fifth of the on-demand price
const MIN_SPOT_PRICE_DIVISOR: f64 = 5.0;

fn gb_price(hourly_price: f64, entry: &OnDemandCatalogEntry) -> Result<f64, ParseError> {
    let weighted_units = CPU_MEM_WEIGHT * f64::from(entry.vcpu_count) + entry.memory_gib;
    if weighted_units == 0.0 {
        return Err(ParseError::EmptyCapacity);
    }
    Ok(hourly_price / weighted_units)
}

/// Split an on-demand hourly price into per-vCPU and per-GiB unit prices.
///
/// Invariant: `cpu_price == CPU_MEM_WEIGHT * mem_price`.
pub fn on_demand_unit_price(entry: &OnDemandCatalogEntry) -> Result<UnitPrice, ParseError> {
    let gb = gb_price(entry.price_per_hour, entry)?;

    Ok(UnitPrice {
        instance_type: entry.instance_type.clone(),
        az: String::new(),
        cpu_price: CPU_MEM_WEIGHT * gb,
        mem_price: gb,
    })
}

/// Derive spot unit prices, discount and capacity estimates from a spot
/// aggregate and the matching on-demand entry.
///
/// Discount and capacity are returned exactly as computed, without
/// clamping: a spot price below the assumed floor gives capacity < 0, one
/// above the on-demand price gives discount < 0.
pub fn spot_economics(
    aggregate: &SpotAggregate,
    entry: &OnDemandCatalogEntry,
) -> Result<SpotEconomics, ParseError> {
    if entry.price_per_hour == 0.0 {
        return Err(ParseError::ZeroReferencePrice);
    }
    let gb = gb_price(aggregate.mean_price, entry)?;

    let min_spot_price = entry.price_per_hour / MIN_SPOT_PRICE_DIVISOR;
    let discount = 1.0 - aggregate.mean_price / entry.price_per_hour;
    let capacity =
        (aggregate.mean_price - min_spot_price) / (4.0 * entry.price_per_hour / MIN_SPOT_PRICE_DIVISOR);

    Ok(SpotEconomics {
        unit_price: UnitPrice {
            instance_type: aggregate.instance_type.clone(),
            az: aggregate.az.clone(),
            cpu_price: CPU_MEM_WEIGHT * gb,
            mem_price: gb,
        },
        capacity,
        discount,
    })
}
