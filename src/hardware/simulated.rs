use super::{PowerMeter, Relay};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// In-memory relay for bench runs and tests.
///
/// Tracks the logical output state (positive logic regardless of
/// `inverse_logic`) and how often each direction was driven.
#[derive(Debug, Default)]
pub struct SimulatedRelay {
    inverse_logic: bool,
    enabled: AtomicBool,
    enable_calls: AtomicU32,
    disable_calls: AtomicU32,
}

impl SimulatedRelay {
    pub fn new(inverse_logic: bool) -> Self {
        Self {
            inverse_logic,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Level the output pin would be driven to
    pub fn pin_level(&self) -> bool {
        self.is_enabled() != self.inverse_logic
    }

    pub fn enable_calls(&self) -> u32 {
        self.enable_calls.load(Ordering::SeqCst)
    }

    pub fn disable_calls(&self) -> u32 {
        self.disable_calls.load(Ordering::SeqCst)
    }
}

impl Relay for SimulatedRelay {
    fn enable(&self) {
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
        self.enabled.store(true, Ordering::SeqCst);
    }

    fn disable(&self) {
        self.disable_calls.fetch_add(1, Ordering::SeqCst);
        self.enabled.store(false, Ordering::SeqCst);
    }
}

/// Fixed set of readings returned by [`SimulatedPowerMeter`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterReadings {
    pub energy: f64,
    pub power: f64,
    pub current: f64,
    pub voltage: f64,
    pub rms_current: f64,
    pub rms_voltage: f64,
}

/// In-memory power meter whose readings can be changed at runtime
#[derive(Debug, Default)]
pub struct SimulatedPowerMeter {
    readings: Mutex<MeterReadings>,
}

impl SimulatedPowerMeter {
    pub fn new(readings: MeterReadings) -> Self {
        Self {
            readings: Mutex::new(readings),
        }
    }

    pub fn set_readings(&self, readings: MeterReadings) {
        *self.readings.lock() = readings;
    }

    pub fn readings(&self) -> MeterReadings {
        *self.readings.lock()
    }
}

impl PowerMeter for SimulatedPowerMeter {
    fn reset(&self) {
        self.readings.lock().energy = 0.0;
    }

    fn get_energy(&self) -> f64 {
        self.readings.lock().energy
    }

    fn get_power(&self) -> f64 {
        self.readings.lock().power
    }

    fn get_current(&self) -> f64 {
        self.readings.lock().current
    }

    fn get_voltage(&self) -> f64 {
        self.readings.lock().voltage
    }

    fn get_rms_current(&self) -> f64 {
        self.readings.lock().rms_current
    }

    fn get_rms_voltage(&self) -> f64 {
        self.readings.lock().rms_voltage
    }
}
