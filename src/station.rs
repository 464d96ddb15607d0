//! All connectors of one charge point
//!
//! The station builds its connectors from configuration, shares one
//! scheduler, store and observer between them, and runs the boot-time pass
//! that resumes (or closes) sessions interrupted by a restart.

use crate::config::Config;
use crate::connector::{Connector, ConnectorContext};
use crate::error::{EvseError, Result};
use crate::hardware::{power_meter_from_config, relay_from_config};
use crate::logging::{StructuredLogger, get_logger};
use crate::notify::ConnectorObserver;
use crate::persistence::{PersistenceManager, SettingsStore};
use crate::scheduler::Scheduler;
use crate::types::{ChargePointErrorCode, Reason};
use std::sync::Arc;

/// Result of the boot-time resume pass for one connector
#[derive(Debug, Clone, PartialEq)]
pub enum ResumeOutcome {
    /// Session restored; charging continues
    Resumed {
        evse_id: i32,
        connector_id: i32,
        transaction_id: String,
        elapsed_minutes: i64,
    },
    /// Session could not be restored and was closed
    Stopped {
        evse_id: i32,
        connector_id: i32,
        transaction_id: String,
        reason: String,
    },
}

pub struct Station {
    connectors: Vec<Arc<Connector>>,
    store: Arc<PersistenceManager>,
    logger: StructuredLogger,
}

impl Station {
    /// Build every configured connector. A connector whose construction
    /// fails is skipped; the station fails only if none comes up.
    pub fn from_config(
        config: &Config,
        scheduler: Arc<dyn Scheduler>,
        store: Arc<PersistenceManager>,
    ) -> Result<Self> {
        let logger = get_logger("station");
        let settings: Arc<dyn SettingsStore> = store.clone();
        let context = ConnectorContext {
            scheduler,
            settings,
            logger: get_logger("connector"),
            sampling: config.sampling.clone(),
        };

        let mut connectors = Vec::with_capacity(config.connectors.len());
        for connector_config in &config.connectors {
            let scoped =
                logger.for_connector(connector_config.evse_id, connector_config.connector_id);

            let relay = match relay_from_config(&connector_config.relay) {
                Ok(relay) => Some(relay),
                Err(e) => {
                    scoped.error(&format!("Relay unavailable: {}", e));
                    None
                }
            };

            let power_meter = match power_meter_from_config(&connector_config.power_meter) {
                Ok(meter) => Some(meter),
                Err(EvseError::CapabilityDisabled { .. }) => None,
                Err(e) => {
                    scoped.warn(&format!("Power meter unavailable: {}", e));
                    None
                }
            };

            match Connector::new(connector_config, relay, power_meter, context.clone()) {
                Ok(connector) => connectors.push(connector),
                Err(e) => scoped.error(&format!("Cannot bring up connector: {}", e)),
            }
        }

        if connectors.is_empty() {
            return Err(EvseError::config("no connector could be initialised"));
        }

        logger.info(&format!("Station ready with {} connector(s)", connectors.len()));
        Ok(Self {
            connectors,
            store,
            logger,
        })
    }

    pub fn connectors(&self) -> &[Arc<Connector>] {
        &self.connectors
    }

    pub fn connector(&self, evse_id: i32, connector_id: i32) -> Option<Arc<Connector>> {
        self.connectors
            .iter()
            .find(|c| c.evse_id() == evse_id && c.connector_id() == connector_id)
            .cloned()
    }

    /// Route every connector's status changes to one observer
    pub fn attach_observer(&self, observer: &Arc<dyn ConnectorObserver>) {
        for connector in &self.connectors {
            connector.set_observer(Arc::clone(observer));
        }
    }

    /// Resume the sessions that were active when the device went down.
    ///
    /// The persisted status is restored first so the connector accepts the
    /// resume. Sessions that cannot be resumed are stopped with reason
    /// `Other`.
    pub fn resume_sessions(&self) -> Vec<ResumeOutcome> {
        let mut outcomes = Vec::new();

        for connector in &self.connectors {
            let (evse_id, connector_id) = (connector.evse_id(), connector.connector_id());
            let Some(record) = self.store.connector_record(evse_id, connector_id) else {
                continue;
            };
            if !record.session.is_active {
                continue;
            }

            let scoped = self.logger.for_connector(evse_id, connector_id);
            let transaction_id = record.session.transaction_id.clone();

            if record.status.is_session_bearing() {
                connector.set_status(record.status, ChargePointErrorCode::NoError);
            }

            match connector.resume_charging(&record.session) {
                Ok(elapsed_minutes) => {
                    outcomes.push(ResumeOutcome::Resumed {
                        evse_id,
                        connector_id,
                        transaction_id,
                        elapsed_minutes,
                    });
                }
                Err(e) => {
                    scoped.warn(&format!("Stopping interrupted session: {}", e));
                    if connector.stop_charging(Reason::Other).is_err() {
                        // never charging: still mark the stored session closed
                        let snapshot = connector.session_snapshot();
                        if let Err(persist_err) =
                            self.store
                                .update_session_info(evse_id, connector_id, &snapshot)
                        {
                            scoped.warn(&format!(
                                "Failed to persist session info: {}",
                                persist_err
                            ));
                        }
                    }
                    outcomes.push(ResumeOutcome::Stopped {
                        evse_id,
                        connector_id,
                        transaction_id,
                        reason: e.error.to_string(),
                    });
                }
            }
        }

        outcomes
    }

    /// Stop every connector that is charging or preparing
    pub fn stop_all(&self, reason: Reason) {
        for connector in &self.connectors {
            if connector.status().is_session_bearing()
                && let Err(e) = connector.stop_charging(reason)
            {
                self.logger.warn(&format!(
                    "Failed to stop connector {}/{}: {}",
                    connector.evse_id(),
                    connector.connector_id(),
                    e
                ));
            }
        }
    }
}
