//! Resolver builder for flexible configuration
//!
//! Starts from `Config::default()` (or a loaded config) and overrides single
//! settings before building a [`Resolver`] or running a whole file.

use crate::batch::{BatchReport, Resolver, process_file};
use crate::config::{Config, ThresholdMetric};
use crate::error::{Result, TzError};
use std::path::{Path, PathBuf};

/// Builder for resolver configuration.
#[derive(Debug, Clone, Default)]
pub struct ResolverBuilder {
    config: Config,
}

impl ResolverBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration. Later setters override its fields.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn threshold_km(mut self, threshold_km: f64) -> Self {
        self.config = self.config.with_threshold_km(threshold_km);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config = self.config.with_workers(workers);
        self
    }

    pub fn undefined_marker(mut self, marker: impl Into<String>) -> Self {
        self.config = self.config.with_undefined_marker(marker);
        self
    }

    pub fn metric(mut self, metric: ThresholdMetric) -> Self {
        self.config = self.config.with_metric(metric);
        self
    }

    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config = self.config.with_output_dir(dir);
        self
    }

    pub fn output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config = self.config.with_output_prefix(prefix);
        self
    }

    /// The configuration as it stands, validated.
    pub fn finish(self) -> Result<Config> {
        self.config.validate().map_err(TzError::InvalidConfig)?;
        Ok(self.config)
    }

    /// Build a resolver whose reference set is the labelled records of `lines`.
    pub fn build<S: AsRef<str>>(self, lines: &[S]) -> Result<Resolver> {
        Resolver::from_lines(lines, self.finish()?)
    }

    /// Resolve `input` and write the output partitions.
    pub fn run(self, input: impl AsRef<Path>) -> Result<BatchReport> {
        process_file(input, self.finish()?)
    }
}
