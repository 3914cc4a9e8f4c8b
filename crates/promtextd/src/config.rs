//! promtextd.toml configuration parser.

use std::path::Path;

use anyhow::Context;
use promtext::{Labels, ReaderEntry};
use serde::{Deserialize, Serialize};

/// Default scrape port (the OpenMetrics exporter convention).
pub const DEFAULT_PORT: u16 = 9464;

/// Default interval of the background update loop, in seconds.
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 15;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Labels attached to every built-in metric.
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
    /// Fixed metrics declared in the config file.
    #[serde(default, rename = "metric", skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<StaticMetricConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            update_interval_secs: DEFAULT_UPDATE_INTERVAL_SECS,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_update_interval() -> u64 {
    DEFAULT_UPDATE_INTERVAL_SECS
}

/// Kinds a config-declared metric may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticKind {
    Counter,
    Gauge,
}

/// A metric with fixed samples, written in any reader-entry shape:
/// `42`, `[42, 1600000000000]`, `[42, { region = "us" }]` or
/// `[42, { region = "us" }, 1600000000000]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticMetricConfig {
    pub name: String,
    pub kind: StaticKind,
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
    #[serde(default)]
    pub values: Vec<serde_json::Value>,
}

impl StaticMetricConfig {
    /// Normalize the raw values into reader entries.
    pub fn entries(&self) -> anyhow::Result<Vec<ReaderEntry>> {
        self.values
            .iter()
            .map(|raw| {
                ReaderEntry::try_from(raw)
                    .with_context(|| format!("metric {}: bad value {raw}", self.name))
            })
            .collect()
    }
}

impl ExporterConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: ExporterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject a zero update interval and values no reader entry shape
    /// matches.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.update_interval_secs == 0 {
            anyhow::bail!("server.update_interval_secs must be at least 1");
        }
        for metric in &self.metrics {
            metric.entries()?;
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Starting config for `promtextd init`.
    pub fn scaffold() -> Self {
        ExporterConfig {
            server: ServerConfig::default(),
            labels: Labels::from([("instance", "localhost")]),
            metrics: vec![StaticMetricConfig {
                name: "deployment_info".to_string(),
                kind: StaticKind::Gauge,
                description: Some("Deployed build per region".to_string()),
                labels: Labels::new(),
                values: vec![
                    serde_json::json!(1),
                    serde_json::json!([1, { "region": "us" }]),
                ],
            }],
        }
    }
}
