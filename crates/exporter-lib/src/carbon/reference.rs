//! Reference-data snapshots
//!
//! Machine wattage tables and regional PUE/carbon-intensity tables are
//! loaded in full from raw tabular rows and frozen into an immutable
//! snapshot. Each refresh builds a new snapshot; a cycle only ever sees
//! one consistent table, never a partial update. Rows originate from a
//! spreadsheet export, so decimal fields may use a comma separator.

use crate::carbon::power::{MachineProfile, WattCurve};
use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Regional facility overhead and grid carbon intensity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionProfile {
    pub region: String,
    /// Grams CO2 per kWh
    pub carbon_intensity: f64,
    pub pue: f64,
}

/// Raw machine reference row; numeric fields are parsed on snapshot build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineRow {
    pub machine_type: String,
    pub vcpu: String,
    pub memory_gib: String,
    pub cpu_idle: String,
    pub cpu_at10: String,
    pub cpu_at50: String,
    pub cpu_at100: String,
    pub mem_idle: String,
    pub mem_at10: String,
    pub mem_at50: String,
    pub mem_at100: String,
    pub embodied_carbon: String,
}

/// Raw region reference row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionRow {
    pub region: String,
    pub carbon_intensity: String,
    pub pue: String,
}

/// Immutable snapshot of both reference tables
#[derive(Debug, Default)]
pub struct ReferenceData {
    machines: HashMap<String, MachineProfile>,
    regions: HashMap<String, RegionProfile>,
    /// Rows dropped during parsing
    pub skipped_rows: usize,
}

impl ReferenceData {
    /// Build a snapshot from raw rows. A row that fails to parse is
    /// skipped and counted; the rest of the table still loads.
    pub fn from_rows(machine_rows: &[MachineRow], region_rows: &[RegionRow]) -> Self {
        let mut data = ReferenceData::default();

        for row in machine_rows {
            match parse_machine_row(row) {
                Ok(profile) => {
                    data.machines.insert(profile.machine_type.clone(), profile);
                }
                Err(err) => {
                    data.skipped_rows += 1;
                    debug!(machine_type = %row.machine_type, error = %err, "Skipping machine row");
                }
            }
        }

        for row in region_rows {
            if row.region.is_empty() {
                data.skipped_rows += 1;
                continue;
            }
            match parse_region_row(row) {
                Ok(profile) => {
                    data.regions.insert(profile.region.clone(), profile);
                }
                Err(err) => {
                    data.skipped_rows += 1;
                    debug!(region = %row.region, error = %err, "Skipping region row");
                }
            }
        }

        data
    }

    /// Look up a machine profile; `None` signals a lookup miss
    pub fn machine(&self, machine_type: &str) -> Option<&MachineProfile> {
        self.machines.get(machine_type)
    }

    /// Look up a region profile; `None` signals a lookup miss
    pub fn region(&self, region: &str) -> Option<&RegionProfile> {
        self.regions.get(region)
    }

    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

fn parse_machine_row(row: &MachineRow) -> Result<MachineProfile, ParseError> {
    Ok(MachineProfile {
        machine_type: row.machine_type.clone(),
        vcpu_count: parse_count("vcpu", &row.vcpu)?,
        memory_gib: parse_count("memory_gib", &row.memory_gib)?,
        cpu_watts: WattCurve {
            idle: parse_decimal("cpu_idle", &row.cpu_idle)?,
            at10: parse_decimal("cpu_at10", &row.cpu_at10)?,
            at50: parse_decimal("cpu_at50", &row.cpu_at50)?,
            at100: parse_decimal("cpu_at100", &row.cpu_at100)?,
        },
        mem_watts: WattCurve {
            idle: parse_decimal("mem_idle", &row.mem_idle)?,
            at10: parse_decimal("mem_at10", &row.mem_at10)?,
            at50: parse_decimal("mem_at50", &row.mem_at50)?,
            at100: parse_decimal("mem_at100", &row.mem_at100)?,
        },
        embodied_carbon: parse_decimal("embodied_carbon", &row.embodied_carbon)?,
    })
}

fn parse_region_row(row: &RegionRow) -> Result<RegionProfile, ParseError> {
    Ok(RegionProfile {
        region: row.region.clone(),
        carbon_intensity: parse_decimal("carbon_intensity", &row.carbon_intensity)?,
        pue: parse_decimal("pue", &row.pue)?,
    })
}

/// Parse a decimal field, tolerating a comma decimal separator
fn parse_decimal(field: &'static str, raw: &str) -> Result<f64, ParseError> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

fn parse_count(field: &'static str, raw: &str) -> Result<u32, ParseError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}
