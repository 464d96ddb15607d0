mod common;

use common::harness;
use evse_connector::error::EvseError;
use evse_connector::types::{ChargePointErrorCode, ChargePointStatus};

#[test]
fn reserve_and_remove() {
    let h = harness();

    h.connector.reserve_connector(7).unwrap();
    assert!(h.connector.is_reserved());
    assert_eq!(h.connector.reservation_id(), 7);
    assert_eq!(h.observer.snapshots()[0].reservation_id, 7);

    h.connector.remove_reservation().unwrap();
    assert!(h.connector.is_available());
    assert_eq!(h.connector.reservation_id(), -1);
    assert_eq!(
        h.observer.statuses(),
        vec![ChargePointStatus::Reserved, ChargePointStatus::Available]
    );
}

#[test]
fn reserve_rejects_non_positive_id() {
    let h = harness();

    for id in [0, -1] {
        let err = h.connector.reserve_connector(id).unwrap_err();
        assert!(matches!(err, EvseError::InvalidIdentifier { .. }));
    }
    assert!(h.connector.is_available());
    assert!(h.observer.snapshots().is_empty());
}

#[test]
fn reserve_requires_available() {
    let h = harness();
    h.connector.start_charging("1", "TAG").unwrap();

    let err = h.connector.reserve_connector(3).unwrap_err();

    assert!(matches!(
        err,
        EvseError::InvalidState {
            status: ChargePointStatus::Charging,
            ..
        }
    ));
    assert_eq!(h.connector.reservation_id(), -1);
}

#[test]
fn reserving_twice_fails() {
    let h = harness();
    h.connector.reserve_connector(1).unwrap();

    assert!(h.connector.reserve_connector(2).is_err());
    assert_eq!(h.connector.reservation_id(), 1);
}

#[test]
fn remove_without_reservation_fails() {
    let h = harness();
    h.connector
        .set_status(ChargePointStatus::Charging, ChargePointErrorCode::NoError);

    let err = h.connector.remove_reservation().unwrap_err();

    assert!(matches!(err, EvseError::InvalidState { .. }));
    assert!(h.connector.is_charging());
}

#[test]
fn reserved_cannot_be_set_without_reservation() {
    let h = harness();

    h.connector
        .set_status(ChargePointStatus::Reserved, ChargePointErrorCode::NoError);

    assert!(h.connector.is_available());
    assert!(h.store.events().is_empty());
}

#[test]
fn leaving_reserved_clears_the_id() {
    let h = harness();
    h.connector.reserve_connector(9).unwrap();

    h.connector
        .set_status(ChargePointStatus::Unavailable, ChargePointErrorCode::NoError);

    assert!(h.connector.is_unavailable());
    assert_eq!(h.connector.reservation_id(), -1);
}

#[test]
fn reserved_connector_cannot_start_charging() {
    let h = harness();
    h.connector.reserve_connector(4).unwrap();

    assert!(h.connector.start_charging("1", "TAG").is_err());
    assert!(!h.relay.is_enabled());
    assert_eq!(h.connector.reservation_id(), 4);
}
