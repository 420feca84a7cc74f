//! Application configuration loading
//!
//! Optional TOML file combining the core pipeline settings with CLI-only
//! sections (transport IDs to reassemble, report options).

use anyhow::{Context, Result};
use can_inspect_core::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Core pipeline settings (filters, capacities, decode toggle)
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Transport reassembly settings
    #[serde(default)]
    pub cantp: CanTpConfig,

    /// Report settings
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CanTpConfig {
    /// Arbitration IDs whose frames should be reassembled
    #[serde(default)]
    pub ids: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Include the sniffer change table in the report
    #[serde(default)]
    pub sniffer: bool,

    /// Maximum decoded-value rows to print (0 = unlimited)
    #[serde(default)]
    pub max_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            sniffer: false,
            max_rows: 0,
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
