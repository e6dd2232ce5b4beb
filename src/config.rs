//! Configuration for the batch resolver.
//!
//! Every field has a default, so a configuration file only needs to name what
//! it changes.

use crate::error::{Result, TzError};
use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the distance to the nearest labelled point is measured before it is
/// compared with the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMetric {
    /// Straight-line distance between the projected points, as measured by the index
    #[default]
    Chord,
    /// Haversine distance along the sphere's surface
    GreatCircle,
}

/// Batch resolver configuration
///
/// # Example
///
/// ```rust
/// use nearest_tz::{Config, ThresholdMetric};
///
/// let config = Config::default();
/// assert_eq!(config.undefined_marker, "null");
///
/// let json = r#"{
///     "threshold_km": 250,
///     "workers": 4,
///     "metric": "great_circle"
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.metric, ThresholdMetric::GreatCircle);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Matches at or beyond this distance (km) are rejected
    #[serde(default = "Config::default_threshold_km")]
    pub threshold_km: f64,

    /// Timezone token marking a record as unlabelled
    #[serde(default = "Config::default_undefined_marker")]
    pub undefined_marker: String,

    /// Number of worker threads / output partitions (None = available parallelism)
    #[serde(default)]
    pub workers: Option<usize>,

    /// File name prefix of each output partition, followed by its index
    #[serde(default = "Config::default_output_prefix")]
    pub output_prefix: String,

    /// Directory for output partitions (None = next to the input file)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default)]
    pub metric: ThresholdMetric,
}

impl Config {
    fn default_threshold_km() -> f64 {
        100.0
    }

    fn default_undefined_marker() -> String {
        "null".to_string()
    }

    fn default_output_prefix() -> String {
        "output_".to_string()
    }

    pub fn with_threshold_km(mut self, threshold_km: f64) -> Self {
        self.threshold_km = threshold_km;
        self
    }

    pub fn with_undefined_marker(mut self, marker: impl Into<String>) -> Self {
        self.undefined_marker = marker.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = prefix.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_metric(mut self, metric: ThresholdMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Worker count to use: the configured value, or the machine's available
    /// parallelism, or 1 if that cannot be determined.
    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.threshold_km.is_finite() {
            return Err("Threshold must be finite (not NaN or infinity)".to_string());
        }
        if self.threshold_km <= 0.0 {
            return Err("Threshold must be positive".to_string());
        }
        if self.workers == Some(0) {
            return Err("Worker count must be greater than zero".to_string());
        }
        if self.undefined_marker.trim().is_empty() {
            return Err("Undefined marker must not be empty".to_string());
        }
        if self.output_prefix.is_empty() {
            return Err("Output prefix must not be empty".to_string());
        }
        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a `.json` (or, with the toml feature, `.toml`) file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                Self::from_json(&text).map_err(|e| TzError::InvalidConfig(e.to_string()))
            }
            #[cfg(feature = "toml")]
            Some("toml") => {
                Self::from_toml(&text).map_err(|e| TzError::InvalidConfig(e.to_string()))
            }
            _ => Err(TzError::InvalidConfig(format!(
                "Unsupported configuration file: {}",
                path.display()
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold_km: Self::default_threshold_km(),
            undefined_marker: Self::default_undefined_marker(),
            workers: None,
            output_prefix: Self::default_output_prefix(),
            output_dir: None,
            metric: ThresholdMetric::default(),
        }
    }
}
