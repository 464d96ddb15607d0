#![no_main]
use evse_connector::persistence::PersistentState;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(state) = serde_json::from_slice::<PersistentState>(data) else {
        return;
    };
    for record in &state.connectors {
        let _ = chrono::DateTime::parse_from_rfc3339(&record.session.started);
        let _ = record.status.is_session_bearing();
    }
    let _ = serde_json::to_string(&state);
});
