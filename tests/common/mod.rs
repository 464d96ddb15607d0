#![allow(dead_code)]

use evse_connector::config::{ConnectorConfig, SamplingConfig};
use evse_connector::connector::{Connector, ConnectorContext, ConnectorSnapshot};
use evse_connector::error::{EvseError, Result};
use evse_connector::hardware::{MeterReadings, PowerMeter, Relay, SimulatedPowerMeter, SimulatedRelay};
use evse_connector::logging::get_logger;
use evse_connector::notify::ConnectorObserver;
use evse_connector::persistence::SettingsStore;
use evse_connector::scheduler::{Job, JobKey, Scheduler};
use evse_connector::session::SessionSnapshot;
use evse_connector::types::ChargePointStatus;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// What the connector handed to the settings store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Status(ChargePointStatus),
    Session(SessionSnapshot),
}

#[derive(Default)]
pub struct RecordingStore {
    events: Mutex<Vec<StoreEvent>>,
    fail: AtomicBool,
}

impl RecordingStore {
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail.store(true, Ordering::SeqCst);
        store
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        self.events.lock().clone()
    }

    pub fn statuses(&self) -> Vec<ChargePointStatus> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                StoreEvent::Status(s) => Some(s),
                StoreEvent::Session(_) => None,
            })
            .collect()
    }

    pub fn last_session(&self) -> Option<SessionSnapshot> {
        self.events().into_iter().rev().find_map(|e| match e {
            StoreEvent::Session(s) => Some(s),
            StoreEvent::Status(_) => None,
        })
    }

    fn record(&self, event: StoreEvent) -> Result<()> {
        self.events.lock().push(event);
        if self.fail.load(Ordering::SeqCst) {
            return Err(EvseError::io("disk full"));
        }
        Ok(())
    }
}

impl SettingsStore for RecordingStore {
    fn update_session_info(&self, _: i32, _: i32, session: &SessionSnapshot) -> Result<()> {
        self.record(StoreEvent::Session(session.clone()))
    }

    fn update_status(&self, _: i32, _: i32, status: ChargePointStatus) -> Result<()> {
        self.record(StoreEvent::Status(status))
    }
}

/// Scheduler that only records registrations; jobs run when a test fires them
#[derive(Default)]
pub struct ManualScheduler {
    jobs: Mutex<HashMap<JobKey, (Duration, Job)>>,
    registrations: Mutex<Vec<JobKey>>,
    cancellations: Mutex<Vec<JobKey>>,
    fail: AtomicBool,
}

impl ManualScheduler {
    pub fn failing() -> Self {
        let scheduler = Self::default();
        scheduler.fail.store(true, Ordering::SeqCst);
        scheduler
    }

    pub fn registrations(&self) -> Vec<JobKey> {
        self.registrations.lock().clone()
    }

    pub fn cancellations(&self) -> Vec<JobKey> {
        self.cancellations.lock().clone()
    }

    pub fn active_jobs(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn interval(&self, key: JobKey) -> Option<Duration> {
        self.jobs.lock().get(&key).map(|(interval, _)| *interval)
    }

    /// Run the job registered under `key` once
    pub fn fire(&self, key: JobKey) -> bool {
        let job = self.jobs.lock().get(&key).map(|(_, job)| Arc::clone(job));
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_every(&self, interval: Duration, key: JobKey, job: Job) -> Result<()> {
        self.registrations.lock().push(key);
        if self.fail.load(Ordering::SeqCst) {
            return Err(EvseError::scheduling("scheduler stopped"));
        }
        self.jobs.lock().insert(key, (interval, job));
        Ok(())
    }

    fn cancel(&self, key: JobKey) -> bool {
        self.cancellations.lock().push(key);
        self.jobs.lock().remove(&key).is_some()
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    snapshots: Mutex<Vec<ConnectorSnapshot>>,
}

impl RecordingObserver {
    pub fn statuses(&self) -> Vec<ChargePointStatus> {
        self.snapshots.lock().iter().map(|s| s.status).collect()
    }

    pub fn snapshots(&self) -> Vec<ConnectorSnapshot> {
        self.snapshots.lock().clone()
    }
}

impl ConnectorObserver for RecordingObserver {
    fn on_state_changed(&self, snapshot: ConnectorSnapshot) {
        self.snapshots.lock().push(snapshot);
    }
}

/// A connector wired to inspectable doubles
pub struct Harness {
    pub connector: Arc<Connector>,
    pub relay: Arc<SimulatedRelay>,
    pub meter: Arc<SimulatedPowerMeter>,
    pub store: Arc<RecordingStore>,
    pub scheduler: Arc<ManualScheduler>,
    pub observer: Arc<RecordingObserver>,
}

impl Harness {
    pub fn job_key(&self) -> JobKey {
        JobKey::new(self.connector.evse_id(), self.connector.connector_id())
    }
}

pub fn connector_config(evse_id: i32, connector_id: i32) -> ConnectorConfig {
    let mut config = ConnectorConfig {
        evse_id,
        connector_id,
        ..ConnectorConfig::default()
    };
    config.power_meter.enabled = true;
    config
}

pub fn context(store: Arc<RecordingStore>, scheduler: Arc<ManualScheduler>) -> ConnectorContext {
    ConnectorContext {
        scheduler,
        settings: store,
        logger: get_logger("connector"),
        sampling: SamplingConfig::default(),
    }
}

pub fn harness_with(
    config: &ConnectorConfig,
    store: RecordingStore,
    scheduler: ManualScheduler,
) -> Harness {
    let relay = Arc::new(SimulatedRelay::new(false));
    let meter = Arc::new(SimulatedPowerMeter::new(MeterReadings {
        energy: 1.5,
        power: 3680.0,
        current: 16.0,
        voltage: 230.0,
        ..MeterReadings::default()
    }));
    let store = Arc::new(store);
    let scheduler = Arc::new(scheduler);
    let observer = Arc::new(RecordingObserver::default());

    let relay_dyn: Arc<dyn Relay> = relay.clone();
    let meter_dyn: Arc<dyn PowerMeter> = meter.clone();
    let connector = Connector::new(
        config,
        Some(relay_dyn),
        Some(meter_dyn),
        context(store.clone(), scheduler.clone()),
    )
    .expect("connector");
    connector.set_observer(observer.clone());

    Harness {
        connector,
        relay,
        meter,
        store,
        scheduler,
        observer,
    }
}

pub fn harness() -> Harness {
    harness_with(
        &connector_config(1, 1),
        RecordingStore::default(),
        ManualScheduler::default(),
    )
}
