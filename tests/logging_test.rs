mod common;

use common::harness;
use evse_connector::types::Reason;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Capture {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[test]
fn connector_log_lines_carry_transaction_id() {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    let h = harness();
    tracing::subscriber::with_default(subscriber, || {
        h.connector.start_charging("1001", "TAG42").unwrap();
        assert!(h.scheduler.fire(h.job_key()));
        h.connector.stop_charging(Reason::Local).unwrap();
    });

    let lines = capture.lines();
    for message in ["Started charging", "Sampling power meter", "Stopped charging"] {
        let line = lines
            .iter()
            .find(|l| l.contains(message))
            .unwrap_or_else(|| panic!("no log line for {message:?} in {lines:#?}"));
        assert!(line.contains("connector_id=1"), "{line}");
        assert!(line.contains("transaction_id=1001"), "{line}");
    }
}

#[test]
fn rejected_session_is_logged_with_its_transaction() {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    let h = harness();
    tracing::subscriber::with_default(subscriber, || {
        assert!(h.connector.start_charging("1001", "bad-tag").is_err());
    });

    let lines = capture.lines();
    let line = lines
        .iter()
        .find(|l| l.contains("Session rejected"))
        .unwrap();
    assert!(line.contains("transaction_id=1001"));
}
