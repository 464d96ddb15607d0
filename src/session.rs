//! Charging session tracking
//!
//! A [`ChargingSession`] records one transaction: who started it, when, and
//! the meter values sampled while it ran. It performs no I/O; the connector
//! owns it and decides when to persist a [`SessionSnapshot`].

use crate::error::{EvseError, Result};
use crate::types::{Measurand, MeterValue, SampledValue};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Persistable view of a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Whether the session was running when the snapshot was taken
    pub is_active: bool,

    /// Transaction id assigned by the central system
    pub transaction_id: String,

    /// Authorising tag
    pub tag_id: String,

    /// RFC 3339 start timestamp, empty when no session is running
    pub started: String,

    /// Meter values sampled so far
    pub consumption: Vec<MeterValue>,
}

/// Charging session state
#[derive(Debug, Clone, Default)]
pub struct ChargingSession {
    is_active: bool,
    transaction_id: String,
    tag_id: String,
    started: Option<DateTime<Utc>>,
    consumption: Vec<MeterValue>,
}

fn is_alphanumeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(char::is_alphanumeric)
}

impl ChargingSession {
    /// Create an empty, inactive session
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session for the given transaction and tag.
    ///
    /// Both ids must be non-empty and alphanumeric. Previously recorded
    /// consumption is discarded.
    pub fn start(&mut self, transaction_id: &str, tag_id: &str) -> Result<()> {
        if self.is_active {
            return Err(EvseError::SessionAlreadyActive);
        }
        if !is_alphanumeric(transaction_id) {
            return Err(EvseError::invalid_identifier("transaction_id", transaction_id));
        }
        if !is_alphanumeric(tag_id) {
            return Err(EvseError::invalid_identifier("tag_id", tag_id));
        }

        self.transaction_id = transaction_id.to_string();
        self.tag_id = tag_id.to_string();
        self.is_active = true;
        self.started = Some(Utc::now());
        self.consumption.clear();
        Ok(())
    }

    /// End the session. Identity fields are cleared, consumption is kept
    /// until the next start.
    pub fn end(&mut self) {
        if self.is_active {
            self.transaction_id.clear();
            self.tag_id.clear();
            self.is_active = false;
            self.started = None;
        }
    }

    /// Append one sampling pass. Dropped when the session is not active.
    pub fn add_sampled_value(&mut self, samples: Vec<SampledValue>) {
        if self.is_active {
            self.consumption.push(MeterValue::new(samples));
        }
    }

    pub(crate) fn restore(&mut self, started: DateTime<Utc>, consumption: &[MeterValue]) {
        self.started = Some(started);
        self.consumption.extend_from_slice(consumption);
    }

    pub(crate) fn set_transaction_id(&mut self, transaction_id: &str) {
        self.transaction_id = transaction_id.to_string();
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn tag_id(&self) -> &str {
        &self.tag_id
    }

    pub fn started(&self) -> Option<DateTime<Utc>> {
        self.started
    }

    pub fn consumption(&self) -> &[MeterValue] {
        &self.consumption
    }

    /// Average power over all meter values that carry a power reading or a
    /// voltage/current pair.
    ///
    /// A direct power reading wins over a voltage/current pair in the same
    /// group. Groups with neither are left out of both the sum and the count.
    /// Returns 0 when no group qualifies.
    pub fn calculate_avg_power(&self) -> f64 {
        let mut power_sum = 0.0;
        let mut valid_groups = 0u32;

        for meter_value in &self.consumption {
            let mut power = None;
            let mut current = None;
            let mut voltage = None;

            for sampled in &meter_value.sampled_value {
                let slot = match sampled.measurand {
                    Measurand::EnergyActiveExportInterval => continue,
                    Measurand::PowerActiveExport => &mut power,
                    Measurand::CurrentExport => &mut current,
                    Measurand::Voltage => &mut voltage,
                };
                if slot.is_none() {
                    *slot = sampled.numeric();
                }
            }

            let group_power = match (power, current, voltage) {
                (Some(p), _, _) => Some(p),
                (None, Some(i), Some(u)) => Some(u * i),
                _ => None,
            };

            if let Some(p) = group_power {
                power_sum += p;
                valid_groups += 1;
            }
        }

        if valid_groups == 0 {
            return 0.0;
        }
        power_sum / f64::from(valid_groups)
    }

    /// Energy estimate in watt-seconds: average power times the time elapsed
    /// since the session started.
    pub fn calculate_energy_consumption_with_avg_power(&self) -> f64 {
        self.energy_with_avg_power_at(Utc::now())
    }

    /// Same as [`Self::calculate_energy_consumption_with_avg_power`] with an
    /// explicit reference time.
    pub fn energy_with_avg_power_at(&self, now: DateTime<Utc>) -> f64 {
        let Some(started) = self.started else {
            return 0.0;
        };
        #[allow(clippy::cast_precision_loss)]
        let elapsed_secs = (now - started).num_milliseconds() as f64 / 1000.0;
        // sub-second sessions carry no meaningful estimate
        if elapsed_secs < 1.0 {
            return 0.0;
        }
        self.calculate_avg_power() * elapsed_secs
    }

    /// Sum of the strictly positive energy interval readings
    pub fn calculate_energy_consumption(&self) -> f64 {
        self.consumption
            .iter()
            .flat_map(|mv| mv.sampled_value.iter())
            .filter(|sv| sv.measurand == Measurand::EnergyActiveExportInterval)
            .filter_map(SampledValue::numeric)
            .filter(|energy| *energy > 0.0)
            .sum()
    }

    /// Snapshot for persistence
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            is_active: self.is_active,
            transaction_id: self.transaction_id.clone(),
            tag_id: self.tag_id.clone(),
            started: self
                .started
                .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default(),
            consumption: self.consumption.clone(),
        }
    }
}
