//! Outbound "connector changed" notifications
//!
//! A connector calls [`ConnectorObserver::on_state_changed`] while holding its
//! status guard, so implementations must return promptly. [`ChannelNotifier`]
//! forwards snapshots into a bounded queue and drops them when it is full.

use crate::connector::ConnectorSnapshot;
use crate::logging::{StructuredLogger, get_logger};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

pub trait ConnectorObserver: Send + Sync {
    /// Called after every status change. Must not block.
    fn on_state_changed(&self, snapshot: ConnectorSnapshot);
}

/// Observer feeding a bounded tokio channel. Many connectors can share one
/// notifier to fan their changes into a single upstream stream.
pub struct ChannelNotifier {
    tx: mpsc::Sender<ConnectorSnapshot>,
    dropped: AtomicU64,
    logger: StructuredLogger,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end of its queue
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ConnectorSnapshot>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let notifier = Self {
            tx,
            dropped: AtomicU64::new(0),
            logger: get_logger("notify"),
        };
        (notifier, rx)
    }

    /// Number of snapshots dropped because the queue was full or closed
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl ConnectorObserver for ChannelNotifier {
    fn on_state_changed(&self, snapshot: ConnectorSnapshot) {
        match self.tx.try_send(snapshot) {
            Ok(()) => {}
            Err(TrySendError::Full(snapshot)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                self.logger.warn(&format!(
                    "Notification queue full, dropped {} update for connector {}/{}",
                    snapshot.status, snapshot.evse_id, snapshot.connector_id
                ));
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                self.logger.debug("Notification queue closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChargePointErrorCode, ChargePointStatus};

    fn snapshot(status: ChargePointStatus) -> ConnectorSnapshot {
        ConnectorSnapshot {
            evse_id: 1,
            connector_id: 1,
            connector_type: "Type2".to_string(),
            status,
            error_code: ChargePointErrorCode::NoError,
            reservation_id: -1,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (notifier, mut rx) = ChannelNotifier::channel(1);
        notifier.on_state_changed(snapshot(ChargePointStatus::Preparing));
        notifier.on_state_changed(snapshot(ChargePointStatus::Charging));

        assert_eq!(notifier.dropped(), 1);
        assert_eq!(rx.try_recv().unwrap().status, ChargePointStatus::Preparing);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_queue_counts_as_dropped() {
        let (notifier, rx) = ChannelNotifier::channel(4);
        drop(rx);
        notifier.on_state_changed(snapshot(ChargePointStatus::Available));
        assert_eq!(notifier.dropped(), 1);
    }
}
