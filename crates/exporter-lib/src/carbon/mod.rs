//! Carbon side of the engine
//!
//! Per-machine piecewise power model, immutable reference-data snapshots
//! (machine wattage tables, regional PUE and carbon intensity), and the
//! estimator that turns usage samples into watt and CO2 records.

mod estimator;
mod power;
mod reference;

pub use estimator::{co2, estimate, CarbonBatch, BYTES_PER_GB, MILLICORES_PER_CORE};
pub use power::{MachineProfile, WattCurve};
pub use reference::{MachineRow, ReferenceData, RegionProfile, RegionRow};
