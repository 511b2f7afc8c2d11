//! Provider traits for the external data sources
//!
//! The engine only consumes already-fetched, already-paginated raw
//! records; the network clients behind these traits live outside the
//! core. Each implementation is expected to surface transport failures
//! as `ProviderError::Transient` and missing credentials or endpoints as
//! `ProviderError::Config`.

use crate::carbon::{MachineRow, RegionRow};
use crate::errors::ProviderError;
use crate::models::{PriceObservation, UsageSnapshot};
use std::sync::Arc;
use std::time::Duration;

pub use async_trait::async_trait;

/// Spot price history for a lookback window
#[async_trait]
pub trait SpotPriceProvider: Send + Sync {
    async fn spot_price_history(
        &self,
        lookback: Duration,
    ) -> Result<Vec<PriceObservation>, ProviderError>;
}

/// Raw nested on-demand catalog payloads, one per product offer
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn on_demand_catalog(&self) -> Result<Vec<serde_json::Value>, ProviderError>;
}

/// Machine and region reference tables, fetched as raw tabular rows
#[async_trait]
pub trait ReferenceProvider: Send + Sync {
    async fn machine_rows(&self) -> Result<Vec<MachineRow>, ProviderError>;

    async fn region_rows(&self) -> Result<Vec<RegionRow>, ProviderError>;
}

/// Current node and pod resource usage samples
#[async_trait]
pub trait UsageProvider: Send + Sync {
    async fn usage_snapshot(&self) -> Result<UsageSnapshot, ProviderError>;
}

/// The full provider set wired into an engine
#[derive(Clone)]
pub struct Providers {
    pub spot: Arc<dyn SpotPriceProvider>,
    pub catalog: Arc<dyn CatalogProvider>,
    pub reference: Arc<dyn ReferenceProvider>,
    pub usage: Arc<dyn UsageProvider>,
}
