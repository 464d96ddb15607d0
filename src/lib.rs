//! # EVSE connector core
//!
//! Firmware core for a single charging outlet. It sits between the hardware
//! (relay, power meter) and the charge-point protocol layer, keeping relay
//! actuation, periodic metering, crash-recoverable persistence and status
//! reporting consistent with each other.
//!
//! ## Architecture
//!
//! - `connector`: Connector state machine and charging orchestration
//! - `session`: Charging session lifecycle and energy/power aggregation
//! - `hardware`: Relay and power meter capabilities and their factory
//! - `scheduler`: Recurring sampling jobs
//! - `persistence`: Status and session snapshots across restarts
//! - `notify`: Outbound status change notifications
//! - `station`: All connectors of a charge point and the boot resume pass
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `types`: Charge-point protocol vocabulary

pub mod config;
pub mod connector;
pub mod error;
pub mod hardware;
pub mod logging;
pub mod notify;
pub mod persistence;
pub mod scheduler;
pub mod session;
pub mod station;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use connector::{Connector, ConnectorContext, ConnectorSnapshot};
pub use error::{EvseError, Result, ResumeError};
pub use session::{ChargingSession, SessionSnapshot};
pub use station::Station;
