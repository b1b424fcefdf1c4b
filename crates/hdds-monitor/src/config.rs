// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Monitor configuration.
//!
//! Fixed at startup. Loaded from TOML or built from command line flags.

use crate::report::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Monitor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// DDS domain ID to monitor.
    #[serde(default)]
    pub domain: u32,

    /// Histogram bin count for statistics queries (reserved).
    #[serde(default = "default_bins")]
    pub bins: u32,

    /// Polling interval (seconds).
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Report output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Stop after this many polling ticks (unbounded when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ticks: Option<u64>,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bins() -> u32 {
    1
}

fn default_interval() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            domain: 0,
            bins: default_bins(),
            interval_secs: default_interval(),
            format: OutputFormat::Text,
            max_ticks: None,
            log_level: default_log_level(),
        }
    }
}

impl MonitorConfig {
    /// Configuration for `domain` with every other value defaulted.
    pub fn for_domain(domain: u32) -> Self {
        Self {
            domain,
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "interval_secs must be at least 1".into(),
            ));
        }
        if self.max_ticks == Some(0) {
            return Err(ConfigError::Invalid("max_ticks must be at least 1".into()));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}
