use super::{
    Config, ConnectorConfig, LoggingConfig, PersistenceConfig, PowerMeterConfig, RelayConfig,
    SamplingConfig,
};
use crate::hardware::{MeterReadings, TYPE_SIMULATED};
use crate::types::Measurand;

/// Session cap applied when none (or a non-positive one) is configured
pub const DEFAULT_MAX_CHARGING_TIME: i32 = 180;

/// Sampling interval used when the central system sets none
pub const DEFAULT_SAMPLE_INTERVAL_SECONDS: u64 = 10;

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            evse_id: 1,
            connector_id: 1,
            connector_type: "Type2".to_string(),
            max_charging_time: DEFAULT_MAX_CHARGING_TIME,
            relay: RelayConfig::default(),
            power_meter: PowerMeterConfig::default(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            relay_type: TYPE_SIMULATED.to_string(),
            pin: 17,
            inverse_logic: false,
        }
    }
}

impl Default for PowerMeterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            meter_type: TYPE_SIMULATED.to_string(),
            simulated: MeterReadings::default(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_SAMPLE_INTERVAL_SECONDS,
            measurands: vec![
                Measurand::EnergyActiveExportInterval,
                Measurand::PowerActiveExport,
                Measurand::CurrentExport,
                Measurand::Voltage,
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/evse-connector.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            state_file: "/data/evse_state.json".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connectors: vec![ConnectorConfig::default()],
            sampling: SamplingConfig::default(),
            logging: LoggingConfig::default(),
            persistence: PersistenceConfig::default(),
            notification_capacity: 64,
        }
    }
}
