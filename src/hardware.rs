//! Hardware capabilities consumed by the connector
//!
//! The connector only sees the [`Relay`] and [`PowerMeter`] traits. Concrete
//! drivers live outside this crate; the factory functions here pick an
//! implementation by the type tag in the configuration and report
//! unsupported or disabled capabilities as errors.

mod simulated;

pub use simulated::{MeterReadings, SimulatedPowerMeter, SimulatedRelay};

use crate::config::{PowerMeterConfig, RelayConfig};
use crate::error::{EvseError, Result};
use crate::logging::get_logger;
use std::sync::Arc;

/// Type tag of the in-memory relay and meter
pub const TYPE_SIMULATED: &str = "simulated";

/// Output switch feeding the outlet. Calls are synchronous and may block on
/// bus I/O.
pub trait Relay: Send + Sync {
    fn enable(&self);
    fn disable(&self);
}

/// Measurement hardware attached to the outlet
pub trait PowerMeter: Send + Sync {
    fn reset(&self);
    fn get_energy(&self) -> f64;
    fn get_power(&self) -> f64;
    fn get_current(&self) -> f64;
    fn get_voltage(&self) -> f64;
    fn get_rms_current(&self) -> f64;
    fn get_rms_voltage(&self) -> f64;
}

/// Build the relay described by the configuration
pub fn relay_from_config(config: &RelayConfig) -> Result<Arc<dyn Relay>> {
    let logger = get_logger("hardware");
    logger.debug(&format!(
        "Creating relay of type {} at pin {}",
        config.relay_type, config.pin
    ));

    if config.pin == 0 {
        return Err(EvseError::validation(
            "relay.pin",
            "pin number must be greater than 0",
        ));
    }

    match config.relay_type.as_str() {
        TYPE_SIMULATED => Ok(Arc::new(SimulatedRelay::new(config.inverse_logic))),
        other => Err(EvseError::unsupported(format!(
            "relay type not supported: {}",
            other
        ))),
    }
}

/// Build the power meter described by the configuration
pub fn power_meter_from_config(config: &PowerMeterConfig) -> Result<Arc<dyn PowerMeter>> {
    if !config.enabled {
        return Err(EvseError::disabled("power meter not enabled"));
    }

    let logger = get_logger("hardware");
    logger.info(&format!("Creating a new power meter: {}", config.meter_type));

    match config.meter_type.as_str() {
        TYPE_SIMULATED => Ok(Arc::new(SimulatedPowerMeter::new(config.simulated))),
        other => Err(EvseError::unsupported(format!(
            "power meter type not supported: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_meter_is_reported() {
        let config = PowerMeterConfig {
            enabled: false,
            ..PowerMeterConfig::default()
        };
        assert!(matches!(
            power_meter_from_config(&config),
            Err(EvseError::CapabilityDisabled { .. })
        ));
    }

    #[test]
    fn unknown_types_are_unsupported() {
        let meter = PowerMeterConfig {
            enabled: true,
            meter_type: "cs5460a".to_string(),
            ..PowerMeterConfig::default()
        };
        assert!(matches!(
            power_meter_from_config(&meter),
            Err(EvseError::UnsupportedCapability { .. })
        ));

        let relay = RelayConfig {
            relay_type: "gpio".to_string(),
            ..RelayConfig::default()
        };
        assert!(matches!(
            relay_from_config(&relay),
            Err(EvseError::UnsupportedCapability { .. })
        ));
    }

    #[test]
    fn relay_pin_zero_is_rejected() {
        let relay = RelayConfig {
            pin: 0,
            ..RelayConfig::default()
        };
        assert!(matches!(
            relay_from_config(&relay),
            Err(EvseError::Validation { ref field, .. }) if field == "relay.pin"
        ));
        assert!(relay_from_config(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn simulated_meter_reports_configured_readings() {
        let config = PowerMeterConfig {
            enabled: true,
            meter_type: TYPE_SIMULATED.to_string(),
            simulated: MeterReadings {
                voltage: 230.0,
                ..MeterReadings::default()
            },
        };
        let meter = power_meter_from_config(&config).unwrap();
        assert!((meter.get_voltage() - 230.0).abs() < f64::EPSILON);
    }
}
