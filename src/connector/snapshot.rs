use super::{Connector, ConnectorState};
use crate::types::{ChargePointErrorCode, ChargePointStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity and status of a connector at the moment it changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorSnapshot {
    pub evse_id: i32,
    pub connector_id: i32,
    pub connector_type: String,
    pub status: ChargePointStatus,
    pub error_code: ChargePointErrorCode,
    pub reservation_id: i32,
    pub timestamp: DateTime<Utc>,
}

impl Connector {
    pub(super) fn snapshot_of(&self, state: &ConnectorState) -> ConnectorSnapshot {
        ConnectorSnapshot {
            evse_id: self.evse_id,
            connector_id: self.connector_id,
            connector_type: self.connector_type.clone(),
            status: state.status,
            error_code: state.error_code,
            reservation_id: state.reservation_id,
            timestamp: Utc::now(),
        }
    }

    /// Current identity and status
    pub fn snapshot(&self) -> ConnectorSnapshot {
        let state = self.state.lock();
        self.snapshot_of(&state)
    }
}
