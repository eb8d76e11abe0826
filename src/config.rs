use anyhow::{Context, Result};
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use validator::Validate;

use crate::domain::DEFAULT_TARGET_COLUMN;
use crate::forecast::DEFAULT_HORIZON;
use crate::ml::WeightPolicy;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub server: ServerConfig,
    pub data: DataConfig,
    #[validate(nested)]
    pub forecast: ForecastConfig,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[validate(range(min = 1))]
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[validate(range(min = 1024))]
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

fn default_request_timeout() -> u64 {
    300
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub model_bundle_path: PathBuf,
    pub historical_dataset_path: PathBuf,
    #[serde(default = "default_target_column")]
    pub target_column: String,
}

fn default_target_column() -> String {
    DEFAULT_TARGET_COLUMN.to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ForecastConfig {
    /// Lag distance of the target feature, in days.
    #[validate(range(min = 1))]
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    #[validate(range(min = 0.0))]
    #[serde(default = "default_weight_sum_tolerance")]
    pub weight_sum_tolerance: f64,
    #[serde(default = "default_true")]
    pub validate_weight_sum: bool,
}

impl ForecastConfig {
    pub fn weight_policy(&self) -> WeightPolicy {
        WeightPolicy {
            require_unit_sum: self.validate_weight_sum,
            tolerance: self.weight_sum_tolerance,
        }
    }
}

fn default_horizon() -> usize {
    DEFAULT_HORIZON
}

fn default_weight_sum_tolerance() -> f64 {
    WeightPolicy::default().tolerance
}

fn default_true() -> bool {
    true
}

impl Config {
    /// `config/default.toml` overlaid with `LLF__SECTION__KEY` environment variables.
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("LLF__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().context("invalid configuration")?;
        config.validate().context("configuration failed validation")?;
        Ok(config)
    }
}
