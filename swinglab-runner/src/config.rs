//! Run configuration, loaded from TOML.
//!
//! One file describes a complete, reproducible run: the simulation window and
//! policies, which strategy and regime gate to build, where the bar files
//! live, and how many Monte Carlo trials to draw.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use swinglab_core::engine::{ConfigError, SimulationConfig};
use swinglab_core::strategy::{ChoppinessTrendParams, ZScoreReversionParams};

use crate::monte_carlo::McConfig;

#[derive(Debug, Error)]
pub enum RunnerConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Simulation(#[from] ConfigError),
    #[error("regime gate needs index instrument '{0}', which was not loaded")]
    MissingIndex(String),
    #[error("gate period must be >= 1")]
    GatePeriod,
}

/// Which signal provider to build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    ChoppinessTrend(ChoppinessTrendParams),
    ZscoreReversion(ZScoreReversionParams),
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::ChoppinessTrend(ChoppinessTrendParams::default())
    }
}

fn default_gate_period() -> usize {
    200
}

/// Market-regime filter applied before every scan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GateConfig {
    #[default]
    AlwaysOpen,
    /// Open while the index's last close is above its SMA.
    SmaTrend {
        index: String,
        #[serde(default = "default_gate_period")]
        period: usize,
    },
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Where bar files live and how symbols map to asset classes. Symbols not
/// listed are equities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub crypto: Vec<String>,
    #[serde(default)]
    pub forex: Vec<String>,
    #[serde(default)]
    pub indices: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            crypto: Vec::new(),
            forex: Vec::new(),
            indices: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub monte_carlo: McConfig,
    #[serde(default)]
    pub data: DataConfig,
}

impl RunConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, RunnerConfigError> {
        let config: RunConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, RunnerConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| RunnerConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), RunnerConfigError> {
        self.simulation.validate()?;
        if let GateConfig::SmaTrend { period: 0, .. } = self.gate {
            return Err(RunnerConfigError::GatePeriod);
        }
        Ok(())
    }

    /// Content hash of the configuration. Two runs with equal fingerprints
    /// and equal data produce identical reports.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
