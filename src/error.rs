//! Error types and handling for the EVSE connector core
//!
//! This module defines the error types used throughout the crate,
//! providing consistent error handling and reporting.

use crate::types::ChargePointStatus;
use thiserror::Error;

/// Result type alias for connector operations
pub type Result<T> = std::result::Result<T, EvseError>;

/// Main error type for the connector core
#[derive(Debug, Error)]
pub enum EvseError {
    /// Non-positive EVSE, connector or reservation id, or a malformed session id
    #[error("Invalid identifier: {field} = {value}")]
    InvalidIdentifier { field: String, value: String },

    /// A mandatory capability was not supplied
    #[error("Missing hardware: {message}")]
    MissingHardware { message: String },

    /// Operation forbidden by the current connector status
    #[error("Invalid state: cannot {operation} while {status}")]
    InvalidState {
        operation: String,
        status: ChargePointStatus,
    },

    /// Stop requested on a connector that is neither charging nor preparing
    #[error("Connector not charging")]
    NotCharging,

    /// Session start requested while a session is already running
    #[error("Session already active")]
    SessionAlreadyActive,

    /// Resumed session already ran past the configured cap
    #[error("Session time limit exceeded: {elapsed_minutes} of {max_minutes} minutes")]
    SessionTimeLimitExceeded {
        elapsed_minutes: i64,
        max_minutes: i64,
    },

    /// Malformed persisted data (timestamps, numbers)
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Periodic job could not be armed
    #[error("Scheduling error: {message}")]
    Scheduling { message: String },

    /// Capability type tag not known to the factory
    #[error("Unsupported capability: {message}")]
    UnsupportedCapability { message: String },

    /// Capability switched off in configuration
    #[error("Capability disabled: {message}")]
    CapabilityDisabled { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl EvseError {
    /// Create a new invalid identifier error
    pub fn invalid_identifier<S: Into<String>>(field: S, value: impl ToString) -> Self {
        EvseError::InvalidIdentifier {
            field: field.into(),
            value: value.to_string(),
        }
    }

    /// Create a new missing hardware error
    pub fn missing_hardware<S: Into<String>>(message: S) -> Self {
        EvseError::MissingHardware {
            message: message.into(),
        }
    }

    /// Create a new invalid state error
    pub fn invalid_state<S: Into<String>>(operation: S, status: ChargePointStatus) -> Self {
        EvseError::InvalidState {
            operation: operation.into(),
            status,
        }
    }

    /// Create a new time limit error
    pub fn time_limit_exceeded(elapsed_minutes: i64, max_minutes: i64) -> Self {
        EvseError::SessionTimeLimitExceeded {
            elapsed_minutes,
            max_minutes,
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        EvseError::Parse {
            message: message.into(),
        }
    }

    /// Create a new scheduling error
    pub fn scheduling<S: Into<String>>(message: S) -> Self {
        EvseError::Scheduling {
            message: message.into(),
        }
    }

    /// Create a new unsupported capability error
    pub fn unsupported<S: Into<String>>(message: S) -> Self {
        EvseError::UnsupportedCapability {
            message: message.into(),
        }
    }

    /// Create a new capability disabled error
    pub fn disabled<S: Into<String>>(message: S) -> Self {
        EvseError::CapabilityDisabled {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        EvseError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        EvseError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        EvseError::Io {
            message: message.into(),
        }
    }
}

/// Failure of a boot-time resume, carrying the elapsed time the caller
/// should act on. The elapsed value always equals the charging cap, so
/// the caller's fallback is to stop immediately.
#[derive(Debug, Error)]
#[error("Cannot resume session after {elapsed_minutes} minutes: {error}")]
pub struct ResumeError {
    #[source]
    pub error: EvseError,
    pub elapsed_minutes: i64,
}

impl ResumeError {
    pub fn new(error: EvseError, elapsed_minutes: i64) -> Self {
        Self {
            error,
            elapsed_minutes,
        }
    }
}

impl From<std::io::Error> for EvseError {
    fn from(err: std::io::Error) -> Self {
        EvseError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for EvseError {
    fn from(err: serde_yaml::Error) -> Self {
        EvseError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for EvseError {
    fn from(err: serde_json::Error) -> Self {
        EvseError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<chrono::ParseError> for EvseError {
    fn from(err: chrono::ParseError) -> Self {
        EvseError::parse(format!("datetime: {}", err))
    }
}
