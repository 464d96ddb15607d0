//! Persistence of connector status and session snapshots
//!
//! Connectors report every status change and every session start/stop
//! through [`SettingsStore`]. [`PersistenceManager`] keeps those snapshots in
//! a JSON file so an interrupted session can be resumed after a reboot.

use crate::error::Result;
use crate::logging::{StructuredLogger, get_logger};
use crate::session::SessionSnapshot;
use crate::types::ChargePointStatus;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sink for connector snapshots. Failures are reported to the caller, which
/// logs them without undoing the operation that produced the snapshot.
pub trait SettingsStore: Send + Sync {
    fn update_session_info(
        &self,
        evse_id: i32,
        connector_id: i32,
        session: &SessionSnapshot,
    ) -> Result<()>;

    fn update_status(&self, evse_id: i32, connector_id: i32, status: ChargePointStatus)
    -> Result<()>;
}

/// Last known state of one connector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorRecord {
    pub evse_id: i32,
    pub connector_id: i32,
    pub status: ChargePointStatus,
    pub session: SessionSnapshot,
}

/// Persistent state structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistentState {
    pub connectors: Vec<ConnectorRecord>,
}

impl PersistentState {
    fn record_mut(&mut self, evse_id: i32, connector_id: i32) -> &mut ConnectorRecord {
        let index = match self
            .connectors
            .iter()
            .position(|r| r.evse_id == evse_id && r.connector_id == connector_id)
        {
            Some(index) => index,
            None => {
                self.connectors.push(ConnectorRecord {
                    evse_id,
                    connector_id,
                    ..ConnectorRecord::default()
                });
                self.connectors.len() - 1
            }
        };
        &mut self.connectors[index]
    }
}

/// JSON file backed [`SettingsStore`]
pub struct PersistenceManager {
    file_path: PathBuf,
    state: Mutex<PersistentState>,
    logger: StructuredLogger,
}

impl PersistenceManager {
    /// Create a new persistence manager
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            state: Mutex::new(PersistentState::default()),
            logger: get_logger("persistence"),
        }
    }

    /// Load state from disk. A missing file leaves the defaults in place.
    pub fn load(&self) -> Result<()> {
        if !self.file_path.exists() {
            self.logger
                .info("No persistent state file found, using defaults");
            return Ok(());
        }

        let contents = std::fs::read_to_string(&self.file_path)?;
        let loaded: PersistentState = serde_json::from_str(&contents)?;
        self.logger.info(&format!(
            "Loaded persistent state for {} connector(s)",
            loaded.connectors.len()
        ));
        *self.state.lock() = loaded;

        Ok(())
    }

    /// Save state to disk
    pub fn save(&self) -> Result<()> {
        let state = self.state.lock();
        self.write(&state)
    }

    fn write(&self, state: &PersistentState) -> Result<()> {
        let contents = serde_json::to_string_pretty(state)?;
        // readers only ever see a complete file
        let tmp_path = self.file_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents)?;
        std::fs::rename(&tmp_path, &self.file_path)?;
        self.logger.debug("Saved persistent state to disk");
        Ok(())
    }

    /// Last known state of a connector
    pub fn connector_record(&self, evse_id: i32, connector_id: i32) -> Option<ConnectorRecord> {
        self.state
            .lock()
            .connectors
            .iter()
            .find(|r| r.evse_id == evse_id && r.connector_id == connector_id)
            .cloned()
    }

    /// All known connector records
    pub fn records(&self) -> Vec<ConnectorRecord> {
        self.state.lock().connectors.clone()
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

impl SettingsStore for PersistenceManager {
    fn update_session_info(
        &self,
        evse_id: i32,
        connector_id: i32,
        session: &SessionSnapshot,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.record_mut(evse_id, connector_id).session = session.clone();
        self.write(&state)
    }

    fn update_status(
        &self,
        evse_id: i32,
        connector_id: i32,
        status: ChargePointStatus,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.record_mut(evse_id, connector_id).status = status;
        self.write(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_created_on_first_update() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = PersistenceManager::new(dir.path().join("state.json"));
        assert!(mgr.connector_record(1, 1).is_none());

        mgr.update_status(1, 1, ChargePointStatus::Charging).unwrap();
        mgr.update_status(1, 2, ChargePointStatus::Reserved).unwrap();
        mgr.update_status(1, 1, ChargePointStatus::Finishing).unwrap();

        assert_eq!(mgr.records().len(), 2);
        assert_eq!(
            mgr.connector_record(1, 1).unwrap().status,
            ChargePointStatus::Finishing
        );
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = PersistenceManager::new(dir.path().join("absent.json"));
        assert!(mgr.load().is_ok());
        assert!(mgr.records().is_empty());
    }
}
