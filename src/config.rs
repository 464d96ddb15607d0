//! Configuration management for the EVSE connector core
//!
//! This module handles loading, validation, and management of the
//! configuration from YAML files. Defaults live in `config/defaults.rs`.

mod defaults;

pub use defaults::{DEFAULT_MAX_CHARGING_TIME, DEFAULT_SAMPLE_INTERVAL_SECONDS};

use crate::error::{EvseError, Result};
use crate::hardware::MeterReadings;
use crate::types::Measurand;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connectors (physical outlets) of this charge point
    pub connectors: Vec<ConnectorConfig>,

    /// Meter value sampling
    pub sampling: SamplingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Where status and session snapshots are kept
    pub persistence: PersistenceConfig,

    /// Capacity of the outbound status notification queue
    pub notification_capacity: usize,
}

/// One physical outlet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    pub evse_id: i32,
    pub connector_id: i32,

    /// Free-form connector type tag (Type2, Schuko, ...)
    pub connector_type: String,

    /// Session cap in minutes; non-positive values fall back to 180
    pub max_charging_time: i32,

    pub relay: RelayConfig,

    pub power_meter: PowerMeterConfig,
}

/// Relay hardware selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Driver type tag
    pub relay_type: String,

    /// Output pin number
    pub pin: u32,

    /// Whether the output is active-low
    pub inverse_logic: bool,
}

/// Power meter hardware selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerMeterConfig {
    pub enabled: bool,

    /// Driver type tag
    pub meter_type: String,

    /// Readings reported by the simulated meter
    pub simulated: MeterReadings,
}

/// Periodic meter sampling while a session runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Seconds between two sampling passes
    pub interval_seconds: u64,

    /// Quantities read in each pass
    pub measurands: Vec<Measurand>,
}

impl SamplingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console-specific level
    pub console_level: Option<String>,

    /// Optional file-specific level
    pub file_level: Option<String>,

    /// Path to log file or directory
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Snapshot storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// JSON file holding status and session snapshots
    pub state_file: String,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = [
            "evse_config.yaml",
            "/data/evse_config.yaml",
            "/etc/evse/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                let config = Self::from_file(path)?;
                config.validate()?;
                return Ok(config);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.connectors.is_empty() {
            return Err(EvseError::validation(
                "connectors",
                "At least one connector is required",
            ));
        }

        let mut seen = HashSet::new();
        for connector in &self.connectors {
            if connector.evse_id <= 0 {
                return Err(EvseError::validation(
                    "connectors.evse_id",
                    "Must be greater than 0",
                ));
            }
            if connector.connector_id <= 0 {
                return Err(EvseError::validation(
                    "connectors.connector_id",
                    "Must be greater than 0",
                ));
            }
            if connector.relay.pin == 0 {
                return Err(EvseError::validation(
                    "connectors.relay.pin",
                    "Must be greater than 0",
                ));
            }
            if !seen.insert((connector.evse_id, connector.connector_id)) {
                return Err(EvseError::Validation {
                    field: "connectors".to_string(),
                    message: format!(
                        "Duplicate connector {} on EVSE {}",
                        connector.connector_id, connector.evse_id
                    ),
                });
            }
        }

        if self.sampling.interval_seconds == 0 {
            return Err(EvseError::validation(
                "sampling.interval_seconds",
                "Must be greater than 0",
            ));
        }

        if self.sampling.measurands.is_empty() {
            return Err(EvseError::validation(
                "sampling.measurands",
                "At least one measurand is required",
            ));
        }

        if self.persistence.state_file.is_empty() {
            return Err(EvseError::validation(
                "persistence.state_file",
                "Path cannot be empty",
            ));
        }

        if self.notification_capacity == 0 {
            return Err(EvseError::validation(
                "notification_capacity",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}
