//! Connector state machine
//!
//! A [`Connector`] models one physical outlet. It owns the charging session,
//! drives the relay, samples the power meter on a schedule and reports every
//! status change to the settings store and the attached observer.
//!
//! Status, error code and reservation id live behind one guard; each change
//! and its paired persist/notify call happen while that guard is held. Relay
//! actuation and meter reads happen outside it so slow bus I/O never blocks
//! status queries.
//!
//! Start, resume and stop are serialised by a separate transition lock held
//! for the whole operation, relay I/O included. It is reentrant so a relay
//! driver or observer calling back into the connector on the same thread
//! does not deadlock; such a nested transition is caught by the re-check
//! after the relay is switched on.

mod charging;
mod sampling;
mod snapshot;

pub use snapshot::ConnectorSnapshot;

use crate::config::{ConnectorConfig, DEFAULT_MAX_CHARGING_TIME, SamplingConfig};
use crate::error::{EvseError, Result};
use crate::hardware::{PowerMeter, Relay};
use crate::logging::StructuredLogger;
use crate::notify::ConnectorObserver;
use crate::persistence::SettingsStore;
use crate::scheduler::{JobKey, Scheduler};
use crate::session::{ChargingSession, SessionSnapshot};
use crate::types::{ChargePointErrorCode, ChargePointStatus};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::sync::{Arc, Weak};

/// Services shared by the connectors of one charge point
#[derive(Clone)]
pub struct ConnectorContext {
    pub scheduler: Arc<dyn Scheduler>,
    pub settings: Arc<dyn SettingsStore>,
    pub logger: StructuredLogger,
    pub sampling: SamplingConfig,
}

#[derive(Debug)]
struct ConnectorState {
    status: ChargePointStatus,
    error_code: ChargePointErrorCode,
    reservation_id: i32,
}

#[derive(Debug, Default)]
struct SessionState {
    session: ChargingSession,
    /// Number of meter values already handed out by `pending_meter_values`
    delivered: usize,
}

pub struct Connector {
    evse_id: i32,
    connector_id: i32,
    connector_type: String,
    max_charging_time: i32,
    power_meter_enabled: bool,

    relay: Arc<dyn Relay>,
    power_meter: Option<Arc<dyn PowerMeter>>,

    state: Mutex<ConnectorState>,
    session: Mutex<SessionState>,
    transition: ReentrantMutex<()>,
    observer: RwLock<Option<Arc<dyn ConnectorObserver>>>,

    scheduler: Arc<dyn Scheduler>,
    settings: Arc<dyn SettingsStore>,
    sampling: SamplingConfig,
    logger: StructuredLogger,

    /// Handle given to the sampling job so it never keeps the connector alive
    this: Weak<Connector>,
}

impl Connector {
    /// Create a connector for one outlet.
    ///
    /// EVSE and connector ids must be positive and a relay must be supplied.
    /// A non-positive `max_charging_time` falls back to 180 minutes. The relay
    /// is switched off and the connector starts `Available` with an empty
    /// session.
    pub fn new(
        config: &ConnectorConfig,
        relay: Option<Arc<dyn Relay>>,
        power_meter: Option<Arc<dyn PowerMeter>>,
        context: ConnectorContext,
    ) -> Result<Arc<Self>> {
        let max_charging_time = if config.max_charging_time <= 0 {
            DEFAULT_MAX_CHARGING_TIME
        } else {
            config.max_charging_time
        };

        if config.evse_id <= 0 {
            return Err(EvseError::invalid_identifier("evse_id", config.evse_id));
        }

        if config.connector_id <= 0 {
            return Err(EvseError::invalid_identifier(
                "connector_id",
                config.connector_id,
            ));
        }

        let relay = relay.ok_or_else(|| EvseError::missing_hardware("relay is required"))?;
        relay.disable();

        let logger = context
            .logger
            .for_connector(config.evse_id, config.connector_id);
        logger.info(&format!(
            "Connector created: type {}, max charging time {} min, power meter {}",
            config.connector_type,
            max_charging_time,
            if power_meter.is_some() && config.power_meter.enabled {
                "enabled"
            } else {
                "disabled"
            }
        ));

        Ok(Arc::new_cyclic(|this| Self {
            evse_id: config.evse_id,
            connector_id: config.connector_id,
            connector_type: config.connector_type.clone(),
            max_charging_time,
            power_meter_enabled: config.power_meter.enabled,
            relay,
            power_meter,
            state: Mutex::new(ConnectorState {
                status: ChargePointStatus::Available,
                error_code: ChargePointErrorCode::NoError,
                reservation_id: -1,
            }),
            session: Mutex::new(SessionState::default()),
            transition: ReentrantMutex::new(()),
            observer: RwLock::new(None),
            scheduler: context.scheduler,
            settings: context.settings,
            sampling: context.sampling,
            logger,
            this: this.clone(),
        }))
    }

    /// Attach the observer that receives every status change
    pub fn set_observer(&self, observer: Arc<dyn ConnectorObserver>) {
        *self.observer.write() = Some(observer);
    }

    pub fn clear_observer(&self) {
        *self.observer.write() = None;
    }

    /// Update status and error code, persist the status and notify the
    /// observer, all under the status guard.
    ///
    /// `Reserved` can only be entered through [`Self::reserve_connector`];
    /// leaving it clears the reservation id.
    pub fn set_status(&self, status: ChargePointStatus, error_code: ChargePointErrorCode) {
        let mut state = self.state.lock();
        if status == ChargePointStatus::Reserved && state.reservation_id <= 0 {
            self.logger
                .warn("Ignoring Reserved status without a reservation");
            return;
        }
        if status != ChargePointStatus::Reserved {
            state.reservation_id = -1;
        }
        state.status = status;
        state.error_code = error_code;
        self.publish(&state);
    }

    /// Persist and announce the current state. Caller holds the status guard.
    fn publish(&self, state: &ConnectorState) {
        self.logger.debug(&format!(
            "Status changed to {} ({:?})",
            state.status, state.error_code
        ));

        if let Err(e) = self
            .settings
            .update_status(self.evse_id, self.connector_id, state.status)
        {
            self.logger
                .warn(&format!("Failed to persist connector status: {}", e));
        }

        if let Some(observer) = self.observer.read().as_ref() {
            observer.on_state_changed(self.snapshot_of(state));
        }
    }

    fn persist_session(&self, snapshot: &SessionSnapshot) {
        if let Err(e) =
            self.settings
                .update_session_info(self.evse_id, self.connector_id, snapshot)
        {
            self.logger
                .warn(&format!("Failed to persist session info: {}", e));
        }
    }

    /// Reserve an available connector
    pub fn reserve_connector(&self, reservation_id: i32) -> Result<()> {
        if reservation_id <= 0 {
            return Err(EvseError::invalid_identifier(
                "reservation_id",
                reservation_id,
            ));
        }

        let mut state = self.state.lock();
        if state.status != ChargePointStatus::Available {
            return Err(EvseError::invalid_state("reserve", state.status));
        }

        state.reservation_id = reservation_id;
        state.status = ChargePointStatus::Reserved;
        state.error_code = ChargePointErrorCode::NoError;
        self.publish(&state);
        self.logger
            .info(&format!("Reserved with reservation {}", reservation_id));
        Ok(())
    }

    /// Cancel the reservation and make the connector available again
    pub fn remove_reservation(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.status != ChargePointStatus::Reserved {
            return Err(EvseError::invalid_state("remove reservation", state.status));
        }

        state.reservation_id = -1;
        state.status = ChargePointStatus::Available;
        state.error_code = ChargePointErrorCode::NoError;
        self.publish(&state);
        Ok(())
    }

    pub fn get_status(&self) -> (ChargePointStatus, ChargePointErrorCode) {
        let state = self.state.lock();
        (state.status, state.error_code)
    }

    pub fn status(&self) -> ChargePointStatus {
        self.state.lock().status
    }

    fn status_is(&self, status: ChargePointStatus) -> bool {
        self.status() == status
    }

    pub fn is_available(&self) -> bool {
        self.status_is(ChargePointStatus::Available)
    }

    pub fn is_preparing(&self) -> bool {
        self.status_is(ChargePointStatus::Preparing)
    }

    pub fn is_charging(&self) -> bool {
        self.status_is(ChargePointStatus::Charging)
    }

    pub fn is_suspended_evse(&self) -> bool {
        self.status_is(ChargePointStatus::SuspendedEvse)
    }

    pub fn is_suspended_ev(&self) -> bool {
        self.status_is(ChargePointStatus::SuspendedEv)
    }

    pub fn is_finishing(&self) -> bool {
        self.status_is(ChargePointStatus::Finishing)
    }

    pub fn is_reserved(&self) -> bool {
        self.status_is(ChargePointStatus::Reserved)
    }

    pub fn is_unavailable(&self) -> bool {
        self.status_is(ChargePointStatus::Unavailable)
    }

    pub fn is_faulted(&self) -> bool {
        self.status_is(ChargePointStatus::Faulted)
    }

    /// Active reservation id, -1 when none
    pub fn reservation_id(&self) -> i32 {
        self.state.lock().reservation_id
    }

    pub fn transaction_id(&self) -> String {
        self.session.lock().session.transaction_id().to_string()
    }

    pub fn tag_id(&self) -> String {
        self.session.lock().session.tag_id().to_string()
    }

    pub fn evse_id(&self) -> i32 {
        self.evse_id
    }

    pub fn connector_id(&self) -> i32 {
        self.connector_id
    }

    pub fn connector_type(&self) -> &str {
        &self.connector_type
    }

    /// Session cap in minutes
    pub fn max_charging_time(&self) -> i32 {
        self.max_charging_time
    }

    pub fn power_meter(&self) -> Option<Arc<dyn PowerMeter>> {
        self.power_meter.clone()
    }

    pub fn power_meter_enabled(&self) -> bool {
        self.power_meter_enabled
    }

    fn job_key(&self) -> JobKey {
        JobKey::new(self.evse_id, self.connector_id)
    }

    /// Current session as it would be persisted
    pub fn session_snapshot(&self) -> SessionSnapshot {
        self.session.lock().session.snapshot()
    }

    /// Running energy estimate in watt-seconds from the session's average
    /// power. Cheap and always available; not a final tally.
    pub fn calculate_session_avg_energy_consumption(&self) -> f64 {
        self.session
            .lock()
            .session
            .calculate_energy_consumption_with_avg_power()
    }

    /// Sum of the positive energy interval readings of the current (or last)
    /// session
    pub fn session_energy_consumption(&self) -> f64 {
        self.session.lock().session.calculate_energy_consumption()
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("evse_id", &self.evse_id)
            .field("connector_id", &self.connector_id)
            .field("connector_type", &self.connector_type)
            .field("max_charging_time", &self.max_charging_time)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}
