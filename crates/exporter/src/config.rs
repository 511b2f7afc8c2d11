//! Exporter configuration

use anyhow::Result;
use exporter_lib::EngineConfig;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Exporter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExporterConfig {
    /// Region label applied to every published price record
    #[serde(default = "default_region")]
    pub region: String,

    /// API server port for metrics/health
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding the upstream data feed files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Time between scheduled recomputes, in seconds
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Spot price history window, in hours
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u64,

    /// Per-provider-call deadline, in seconds
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
}

fn default_region() -> String {
    "eu-west-1".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_data_dir() -> String {
    "/var/lib/cost-exporter".to_string()
}

fn default_refresh_interval() -> u64 {
    12 * 60 * 60
}

fn default_lookback_hours() -> u64 {
    24
}

fn default_call_timeout() -> u64 {
    30
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            api_port: default_api_port(),
            data_dir: default_data_dir(),
            refresh_interval_secs: default_refresh_interval(),
            lookback_hours: default_lookback_hours(),
            call_timeout_secs: default_call_timeout(),
        }
    }
}

impl ExporterConfig {
    /// Load configuration from EXPORTER_-prefixed environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("EXPORTER"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|err| {
            warn!(error = %err, "Invalid EXPORTER_ environment overrides, using defaults");
            Self::default()
        }))
    }

    /// Engine tuning derived from this configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            region: self.region.clone(),
            lookback: Duration::from_secs(self.lookback_hours * 60 * 60),
            call_timeout: Duration::from_secs(self.call_timeout_secs),
            refresh_interval: Duration::from_secs(self.refresh_interval_secs),
        }
    }
}
