#![no_main]
use evse_connector::session::ChargingSession;
use evse_connector::types::{Measurand, SampledValue};
use libfuzzer_sys::fuzz_target;

const MEASURANDS: [Measurand; 4] = [
    Measurand::EnergyActiveExportInterval,
    Measurand::PowerActiveExport,
    Measurand::CurrentExport,
    Measurand::Voltage,
];

fuzz_target!(|data: &[u8]| {
    let mut session = ChargingSession::new();
    if session.start("1", "FUZZ").is_err() {
        return;
    }

    // Each line is one group; the first character of a field picks the measurand
    let text = String::from_utf8_lossy(data);
    for line in text.lines() {
        let group: Vec<SampledValue> = line
            .split(',')
            .filter_map(|field| {
                let mut chars = field.chars();
                let tag = chars.next()?;
                Some(SampledValue {
                    measurand: MEASURANDS[tag as usize % MEASURANDS.len()],
                    value: chars.as_str().to_string(),
                })
            })
            .collect();
        session.add_sampled_value(group);
    }

    let _ = session.calculate_avg_power();
    let _ = session.calculate_energy_consumption();
    let _ = session.calculate_energy_consumption_with_avg_power();
});
