// =============================================================================
// Runtime Configuration — dashboard settings with atomic save
// =============================================================================
//
// Central configuration for the Helios backend. Persistence uses an atomic
// tmp + rename pattern to prevent corruption on crash. All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an older
// config file. Secrets (API keys) never live here — they come from the
// environment only.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::FetchMode;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_days() -> u32 {
    30
}

fn default_vs_currency() -> String {
    "usd".to_string()
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_max_prediction_history() -> usize {
    20
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the Helios backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Day range requested from the market-data provider. The provider-side
    /// maximum applies; it is not validated here.
    #[serde(default = "default_days")]
    pub days: u32,

    /// Quote currency for all price series.
    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,

    /// Which provider endpoint backs the price series.
    #[serde(default)]
    pub fetch_mode: FetchMode,

    /// Seconds between refresh ticks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Address the REST API binds to. Overridable via `HELIOS_BIND_ADDR`.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// How many LLM prediction records are retained in state.
    #[serde(default = "default_max_prediction_history")]
    pub max_prediction_history: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            days: default_days(),
            vs_currency: default_vs_currency(),
            fetch_mode: FetchMode::default(),
            poll_interval_secs: default_poll_interval_secs(),
            bind_addr: default_bind_addr(),
            max_prediction_history: default_max_prediction_history(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            days = config.days,
            fetch_mode = %config.fetch_mode,
            poll_interval_secs = config.poll_interval_secs,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}
