//! Pricing side of the engine
//!
//! Spot history aggregation, catalog normalization, blended-price
//! decomposition into per-resource unit prices, and the final join into
//! unified price records.

mod aggregate;
mod catalog;
mod join;
mod unit_price;

pub use aggregate::{aggregate_spot_prices, AggregationResult};
pub use catalog::{normalize_catalog_entry, normalize_catalog_page, NormalizationResult};
pub use join::{build_price_records, JoinResult};
pub use unit_price::{on_demand_unit_price, spot_economics, CPU_MEM_WEIGHT};
