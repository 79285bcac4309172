use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::{default_workers, MatchError};
use crate::models::{Locale, ScoringConstants, WeightConfig};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchingSettings {
    /// Scoring pool size; defaults to the available parallelism
    pub workers: Option<usize>,
    pub max_batch_size: Option<usize>,
    pub distance_cache_size: Option<u64>,
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub default_locale: Locale,
}

impl MatchingSettings {
    pub fn workers(&self) -> usize {
        self.workers.unwrap_or_else(default_workers)
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size.unwrap_or(1000)
    }

    pub fn distance_cache_size(&self) -> u64 {
        self.distance_cache_size.unwrap_or(10_000)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(2_000)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub constants: ScoringConstants,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_location_weight")]
    pub location: f64,
    #[serde(default = "default_price_weight")]
    pub price: f64,
    #[serde(default = "default_amenities_weight")]
    pub amenities: f64,
    #[serde(default = "default_size_weight")]
    pub size: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            location: default_location_weight(),
            price: default_price_weight(),
            amenities: default_amenities_weight(),
            size: default_size_weight(),
        }
    }
}

impl WeightsConfig {
    /// Validated weights for use at the call boundary
    pub fn to_weights(&self) -> Result<WeightConfig, MatchError> {
        WeightConfig::new(self.location, self.price, self.amenities, self.size)
    }
}

fn default_location_weight() -> f64 { 30.0 }
fn default_price_weight() -> f64 { 35.0 }
fn default_amenities_weight() -> f64 { 15.0 }
fn default_size_weight() -> f64 { 20.0 }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with FLATMATCH__)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., FLATMATCH__SERVER__PORT -> server.port
            .add_source(env_source())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?
            .try_deserialize()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("FLATMATCH")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
