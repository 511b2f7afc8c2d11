//! Piecewise power model
//!
//! Maps a utilization percentage to power draw through four fixed tiers,
//! independently for CPU and memory. Tier offsets are additive to idle
//! only, never cumulative across tiers.

use serde::{Deserialize, Serialize};

/// Wattage curve for one resource dimension of a machine type
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WattCurve {
    pub idle: f64,
    /// Offset over idle above 10% usage
    pub at10: f64,
    /// Offset over idle above 50% usage
    pub at50: f64,
    /// Offset over idle at or above 100% usage
    pub at100: f64,
}

impl WattCurve {
    /// Tiered power draw for a usage percentage.
    ///
    /// `usage <= 10` draws idle only; each higher tier adds its own
    /// offset to idle.
    pub fn watt_at(&self, usage_percent: f64) -> f64 {
        if usage_percent <= 10.0 {
            self.idle
        } else if usage_percent < 50.0 {
            self.idle + self.at10
        } else if usage_percent < 100.0 {
            self.idle + self.at50
        } else {
            self.idle + self.at100
        }
    }
}

/// Power characteristics of one machine type.
///
/// The zero-valued default is the fallback profile for unknown machine
/// types: every derived watt and CO2 figure becomes 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineProfile {
    pub machine_type: String,
    pub vcpu_count: u32,
    pub memory_gib: u32,
    pub cpu_watts: WattCurve,
    pub mem_watts: WattCurve,
    /// Amortized manufacturing carbon, applied once per node record
    pub embodied_carbon: f64,
}

impl MachineProfile {
    /// Total node power draw: independent sum of the CPU and memory tiers
    pub fn node_watt(&self, cpu_usage_percent: f64, mem_usage_percent: f64) -> f64 {
        self.cpu_watts.watt_at(cpu_usage_percent) + self.mem_watts.watt_at(mem_usage_percent)
    }

    /// Watts attributed to a single vCPU at the given usage.
    ///
    /// A zero vCPU count (fallback profile) yields 0, not NaN, so pods on
    /// unknown machine types still resolve to zero-valued records.
    pub fn per_unit_cpu_watt(&self, cpu_usage_percent: f64) -> f64 {
        if self.vcpu_count == 0 {
            return 0.0;
        }
        self.cpu_watts.watt_at(cpu_usage_percent) / f64::from(self.vcpu_count)
    }

    /// Watts attributed to a single GiB of memory at the given usage
    pub fn per_unit_mem_watt(&self, mem_usage_percent: f64) -> f64 {
        if self.memory_gib == 0 {
            return 0.0;
        }
        self.mem_watts.watt_at(mem_usage_percent) / f64::from(self.memory_gib)
    }
}
