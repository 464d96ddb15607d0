mod common;

use chrono::{Duration, SecondsFormat, Utc};
use common::{ManualScheduler, RecordingStore, connector_config, harness, harness_with};
use evse_connector::error::EvseError;
use evse_connector::session::SessionSnapshot;
use evse_connector::types::{
    ChargePointErrorCode, ChargePointStatus, Measurand, MeterValue, SampledValue,
};

fn prior_session(minutes_ago: i64) -> SessionSnapshot {
    SessionSnapshot {
        is_active: true,
        transaction_id: "1001".to_string(),
        tag_id: "TAG42".to_string(),
        started: (Utc::now() - Duration::minutes(minutes_ago))
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        consumption: vec![MeterValue::new(vec![
            SampledValue::from_reading(Measurand::PowerActiveExport, 2300.0),
            SampledValue::from_reading(Measurand::EnergyActiveExportInterval, 0.4),
        ])],
    }
}

#[test]
fn resumes_recent_session() {
    let h = harness();
    h.connector
        .set_status(ChargePointStatus::Charging, ChargePointErrorCode::NoError);

    let elapsed = h.connector.resume_charging(&prior_session(30)).unwrap();

    assert!((29..=30).contains(&elapsed));
    assert!(h.connector.is_charging());
    assert!(h.relay.is_enabled());
    assert_eq!(h.connector.transaction_id(), "1001");
    assert_eq!(h.connector.tag_id(), "TAG42");

    let snapshot = h.connector.session_snapshot();
    assert!(snapshot.is_active);
    assert_eq!(snapshot.consumption.len(), 1);
    assert_eq!(h.store.last_session(), Some(snapshot));
    assert_eq!(h.scheduler.registrations(), vec![h.job_key()]);

    // restored values were reported before the restart
    assert!(h.connector.pending_meter_values().is_empty());
    assert!((h.connector.session_energy_consumption() - 0.4).abs() < 1e-9);
}

#[test]
fn resumes_from_preparing() {
    let h = harness();
    h.connector
        .set_status(ChargePointStatus::Preparing, ChargePointErrorCode::NoError);

    assert!(h.connector.resume_charging(&prior_session(5)).is_ok());
    assert!(h.relay.is_enabled());
}

#[test]
fn session_past_cap_is_rejected_with_cap_as_elapsed() {
    let h = harness();
    h.connector
        .set_status(ChargePointStatus::Charging, ChargePointErrorCode::NoError);

    let err = h.connector.resume_charging(&prior_session(200)).unwrap_err();

    assert_eq!(err.elapsed_minutes, 180);
    assert!(matches!(
        err.error,
        EvseError::SessionTimeLimitExceeded {
            max_minutes: 180,
            ..
        }
    ));
    assert!(!h.relay.is_enabled());
    // transaction id kept so it can be stopped upstream
    assert_eq!(h.connector.transaction_id(), "1001");
    assert!(!h.connector.session_snapshot().is_active);
}

#[test]
fn session_past_configured_cap_is_rejected() {
    let mut config = connector_config(1, 1);
    config.max_charging_time = 60;
    let h = harness_with(&config, RecordingStore::default(), ManualScheduler::default());
    h.connector
        .set_status(ChargePointStatus::Charging, ChargePointErrorCode::NoError);

    let err = h.connector.resume_charging(&prior_session(61)).unwrap_err();
    assert_eq!(err.elapsed_minutes, 60);
}

#[test]
fn unparseable_start_time_is_a_parse_error() {
    let h = harness();
    h.connector
        .set_status(ChargePointStatus::Charging, ChargePointErrorCode::NoError);
    let mut prior = prior_session(10);
    prior.started = "yesterday at noon".to_string();

    let err = h.connector.resume_charging(&prior).unwrap_err();

    assert!(matches!(err.error, EvseError::Parse { .. }));
    assert_eq!(err.elapsed_minutes, 180);
    assert_eq!(h.connector.transaction_id(), "1001");
    assert!(!h.relay.is_enabled());
}

#[test]
fn resume_requires_session_bearing_status() {
    let h = harness();

    let err = h.connector.resume_charging(&prior_session(10)).unwrap_err();

    assert!(matches!(
        err.error,
        EvseError::InvalidState {
            status: ChargePointStatus::Available,
            ..
        }
    ));
    assert_eq!(err.elapsed_minutes, 180);
    assert!(!h.relay.is_enabled());
}

#[test]
fn start_time_in_the_future_counts_as_zero_minutes() {
    let h = harness();
    h.connector
        .set_status(ChargePointStatus::Charging, ChargePointErrorCode::NoError);

    let elapsed = h.connector.resume_charging(&prior_session(-15)).unwrap();
    assert_eq!(elapsed, 0);
}

#[test]
fn resume_over_active_session_fails() {
    let h = harness();
    h.connector.start_charging("55", "OTHER").unwrap();

    let err = h.connector.resume_charging(&prior_session(10)).unwrap_err();

    assert!(matches!(err.error, EvseError::SessionAlreadyActive));
    assert_eq!(err.elapsed_minutes, 180);
    assert_eq!(h.connector.transaction_id(), "55");
}

#[test]
fn resumed_session_keeps_sampling() {
    let h = harness();
    h.connector
        .set_status(ChargePointStatus::Charging, ChargePointErrorCode::NoError);
    h.connector.resume_charging(&prior_session(10)).unwrap();

    assert!(h.scheduler.fire(h.job_key()));

    assert_eq!(h.connector.session_snapshot().consumption.len(), 2);
    assert_eq!(h.connector.pending_meter_values().len(), 1);
}
