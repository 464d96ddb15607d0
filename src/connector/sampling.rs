use super::Connector;
use crate::error::Result;
use crate::hardware::PowerMeter;
use crate::scheduler::Job;
use crate::types::{Measurand, MeterValue, SampledValue};
use std::sync::Arc;

fn read_measurand(meter: &dyn PowerMeter, measurand: Measurand) -> f64 {
    match measurand {
        Measurand::EnergyActiveExportInterval => meter.get_energy(),
        Measurand::CurrentExport => meter.get_current(),
        Measurand::PowerActiveExport => meter.get_power(),
        Measurand::Voltage => meter.get_voltage(),
    }
}

impl Connector {
    fn metering_meter(&self) -> Option<&Arc<dyn PowerMeter>> {
        self.power_meter
            .as_ref()
            .filter(|_| self.power_meter_enabled)
    }

    pub(super) fn metering_enabled(&self) -> bool {
        self.metering_meter().is_some()
    }

    /// Read the requested measurands and append them to the active session.
    ///
    /// A reading of exactly zero counts as no reading and is left out. Does
    /// nothing when metering is off or no session is running.
    pub fn sample_power_meter(&self, measurands: &[Measurand]) {
        let Some(meter) = self.metering_meter() else {
            return;
        };
        let transaction_id = {
            let slot = self.session.lock();
            if !slot.session.is_active() {
                return;
            }
            slot.session.transaction_id().to_string()
        };

        self.logger
            .for_transaction(&transaction_id)
            .trace("Sampling power meter");

        #[allow(clippy::float_cmp)]
        let samples: Vec<SampledValue> = measurands
            .iter()
            .filter_map(|&measurand| {
                let reading = read_measurand(meter.as_ref(), measurand);
                (reading != 0.0).then(|| SampledValue::from_reading(measurand, reading))
            })
            .collect();

        if samples.is_empty() {
            return;
        }

        self.session.lock().session.add_sampled_value(samples);
    }

    /// (Re-)register the periodic sampling job for this connector. The
    /// scheduler replaces any job already registered under the same key.
    pub(super) fn arm_sampling(&self) -> Result<()> {
        let connector = self.this.clone();
        let measurands = self.sampling.measurands.clone();
        let job: Job = Arc::new(move || {
            if let Some(connector) = connector.upgrade() {
                connector.sample_power_meter(&measurands);
            }
        });

        self.scheduler
            .schedule_every(self.sampling.interval(), self.job_key(), job)
    }

    /// Meter values recorded since the previous call. The cursor restarts
    /// with every new session.
    pub fn pending_meter_values(&self) -> Vec<MeterValue> {
        let mut slot = self.session.lock();
        let pending = slot
            .session
            .consumption()
            .get(slot.delivered..)
            .map(<[MeterValue]>::to_vec)
            .unwrap_or_default();
        let total = slot.session.consumption().len();
        slot.delivered = total;
        pending
    }
}
