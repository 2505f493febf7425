//! Engine configuration and registry loading.

use anyhow::{Context, Result};
use cobalt_core::{Registry, RegistryValidator};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CobaltConfig {
    /// Path to the serialized metric/report registry.
    #[serde(default = "default_registry_path")]
    pub registry_path: String,

    /// Days of aggregate history kept before cleanup deletes it.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Whether the logger starts enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_registry_path() -> String {
    "config/registry.json".to_string()
}

fn default_retention_days() -> u32 {
    30
}

fn default_enabled() -> bool {
    true
}

impl Default for CobaltConfig {
    fn default() -> Self {
        Self {
            registry_path: default_registry_path(),
            retention_days: default_retention_days(),
            enabled: default_enabled(),
        }
    }
}

/// Load configuration from files and environment.
///
/// Defaults are overridden by `config/default.toml` if present, then by
/// `COBALT__`-prefixed environment variables.
pub fn load_config() -> Result<CobaltConfig> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&CobaltConfig::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("COBALT")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Load and sanity-check a registry from a JSON file.
///
/// Invalid (metric, report) pairs are warned about here but kept: the
/// logger and the periodic job skip them per call, so a registry update
/// that fixes them needs no other state change.
pub fn load_registry(path: impl AsRef<Path>) -> Result<Registry> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read registry from {}", path.display()))?;
    let registry: Registry = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse registry from {}", path.display()))?;

    let invalid = registry
        .metric_reports()
        .filter(|(metric, report)| !RegistryValidator::is_valid(metric, report))
        .count();
    if invalid > 0 {
        warn!(
            customer_id = registry.customer_id,
            project_id = registry.project_id,
            invalid,
            "Registry contains invalid metric/report pairs, they will be skipped"
        );
    }
    Ok(registry)
}
