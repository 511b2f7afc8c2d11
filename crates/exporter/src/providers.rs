//! File-backed data feed providers
//!
//! In deployment a sidecar drops freshly fetched upstream data into the
//! feed directory as JSON files; the exporter only reads them. A
//! missing file means the deployment is wired up wrong and is reported
//! as a configuration error, while an unreadable or malformed file is
//! treated as transient so the next cycle can retry after the sidecar
//! rewrites it.

use async_trait::async_trait;
use exporter_lib::carbon::{MachineRow, RegionRow};
use exporter_lib::engine::{
    CatalogProvider, ReferenceProvider, SpotPriceProvider, UsageProvider,
};
use exporter_lib::{PriceObservation, ProviderError, UsageSnapshot};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Providers reading every upstream feed from JSON files in one directory
pub struct FileFeeds {
    data_dir: PathBuf,
}

impl FileFeeds {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    async fn load<T: DeserializeOwned>(&self, file_name: &str) -> Result<T, ProviderError> {
        let path = self.data_dir.join(file_name);
        if !Path::new(&path).exists() {
            return Err(ProviderError::Config(format!(
                "feed file {} not found",
                path.display()
            )));
        }

        let bytes = tokio::fs::read(&path).await.map_err(|err| {
            ProviderError::Transient(format!("reading {}: {err}", path.display()))
        })?;
        debug!(path = %path.display(), bytes = bytes.len(), "Loaded feed file");

        serde_json::from_slice(&bytes).map_err(|err| {
            ProviderError::Transient(format!("parsing {}: {err}", path.display()))
        })
    }
}

#[async_trait]
impl SpotPriceProvider for FileFeeds {
    async fn spot_price_history(
        &self,
        _lookback: Duration,
    ) -> Result<Vec<PriceObservation>, ProviderError> {
        self.load("spot_prices.json").await
    }
}

#[async_trait]
impl CatalogProvider for FileFeeds {
    async fn on_demand_catalog(&self) -> Result<Vec<serde_json::Value>, ProviderError> {
        self.load("catalog.json").await
    }
}

#[async_trait]
impl ReferenceProvider for FileFeeds {
    async fn machine_rows(&self) -> Result<Vec<MachineRow>, ProviderError> {
        self.load("machines.json").await
    }

    async fn region_rows(&self) -> Result<Vec<RegionRow>, ProviderError> {
        self.load("regions.json").await
    }
}

#[async_trait]
impl UsageProvider for FileFeeds {
    async fn usage_snapshot(&self) -> Result<UsageSnapshot, ProviderError> {
        self.load("usage.json").await
    }
}
