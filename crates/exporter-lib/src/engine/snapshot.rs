//! Published output snapshot

use crate::models::{NodeCarbonRecord, PodCarbonRecord, PriceRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The complete output of one successful recompute cycle.
///
/// Snapshots are immutable once published and replaced wholesale; a
/// failed cycle leaves the previous snapshot untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Region label applied to price records
    pub region: String,
    pub price_records: Vec<PriceRecord>,
    pub node_records: Vec<NodeCarbonRecord>,
    pub pod_records: Vec<PodCarbonRecord>,
    /// None only for the initial empty snapshot
    pub computed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Empty placeholder published before the first successful cycle
    pub fn empty(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Default::default()
        }
    }
}
